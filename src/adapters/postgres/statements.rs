use crate::config::SchemaConfig;
use crate::domain::{BookField, LoanFilter, MemberField};

/// SQL text for every statement the PostgreSQL adapters run.
///
/// Built once from the configured table/column mapping. The mapping is
/// validated as plain identifiers before it gets here; values are always
/// bound as parameters.
#[derive(Debug, Clone)]
pub struct Statements {
    // books
    pub book_stats: String,
    pub list_books: String,
    pub book_exists: String,
    pub lock_books: String,
    pub insert_book: String,
    pub find_books_by_title: String,
    pub find_books_by_author: String,
    pub book_by_id: String,
    pub book_flags_for_update: String,
    pub set_book_lent: String,
    pub delete_book: String,

    // members
    pub member_stats: String,
    pub list_members: String,
    pub member_exists: String,
    pub lock_members: String,
    pub insert_member: String,
    pub find_members_by_name: String,
    pub find_members_by_surname: String,
    pub member_by_id: String,
    pub member_for_update: String,
    pub delete_member: String,

    // loans
    pub loan_stats: String,
    pub list_loans: String,
    pub lock_loans: String,
    pub insert_loan: String,
    pub loans_by_id: String,
    pub loans_by_member: String,
    pub loans_by_book: String,
    pub loans_by_date: String,
    pub loan_books_for_update: String,
    pub delete_loan: String,
    pub count_member_loans: String,
    pub detailed_all: String,
    pub detailed_by_id: String,
    pub detailed_by_member: String,
    pub detailed_by_book: String,
    pub detailed_by_date: String,

    // schema bootstrap
    pub create_books: String,
    pub create_members: String,
    pub create_loans: String,
}

impl Statements {
    pub fn new(schema: &SchemaConfig) -> Self {
        let b = &schema.books;
        let m = &schema.members;
        let l = &schema.loans;

        let book_cols = format!("{}, {}, {}, {}", b.id, b.title, b.author, b.lent);
        let member_cols = format!("{}, {}, {}", m.id, m.name, m.surname);
        let loan_cols = format!("{}, {}, {}, {}", l.id, l.member_id, l.book_id, l.loan_date);

        let select_books = format!("SELECT {} FROM {}", book_cols, b.table);
        let select_members = format!("SELECT {} FROM {}", member_cols, m.table);
        let select_loans = format!("SELECT {} FROM {}", loan_cols, l.table);

        let contains = |column: &str| format!("POSITION(LOWER($1) IN LOWER({})) > 0", column);

        let detailed = format!(
            "SELECT lo.{lid}, lo.{lmember}, lo.{lbook}, lo.{ldate}, \
                    bo.{bid}, bo.{btitle}, bo.{bauthor}, bo.{blent}, \
                    me.{mid}, me.{mname}, me.{msurname} \
             FROM {loans} lo \
             JOIN {books} bo ON bo.{bid} = lo.{lbook} \
             JOIN {members} me ON me.{mid} = lo.{lmember}",
            lid = l.id,
            lmember = l.member_id,
            lbook = l.book_id,
            ldate = l.loan_date,
            loans = l.table,
            bid = b.id,
            btitle = b.title,
            bauthor = b.author,
            blent = b.lent,
            books = b.table,
            mid = m.id,
            mname = m.name,
            msurname = m.surname,
            members = m.table,
        );
        let detailed_where =
            |column: &str| format!("{} WHERE lo.{} = $1 ORDER BY lo.{}", detailed, column, l.id);

        Self {
            book_stats: format!("SELECT COUNT(*), COALESCE(MAX({}), 0) FROM {}", b.id, b.table),
            list_books: format!("{} ORDER BY {}", select_books, b.id),
            book_exists: format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE LOWER({}) = LOWER($1) AND LOWER({}) = LOWER($2))",
                b.table, b.title, b.author
            ),
            lock_books: format!("LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE", b.table),
            insert_book: format!(
                "INSERT INTO {} ({}) VALUES ($1, $2, $3, FALSE) RETURNING {}",
                b.table, book_cols, book_cols
            ),
            find_books_by_title: format!(
                "{} WHERE {} ORDER BY {}",
                select_books,
                contains(&b.title),
                b.id
            ),
            find_books_by_author: format!(
                "{} WHERE {} ORDER BY {}",
                select_books,
                contains(&b.author),
                b.id
            ),
            book_by_id: format!("{} WHERE {} = $1", select_books, b.id),
            book_flags_for_update: format!(
                "SELECT {} FROM {} WHERE {} = $1 FOR UPDATE",
                b.lent, b.table, b.id
            ),
            set_book_lent: format!("UPDATE {} SET {} = $2 WHERE {} = $1", b.table, b.lent, b.id),
            delete_book: format!("DELETE FROM {} WHERE {} = $1", b.table, b.id),

            member_stats: format!("SELECT COUNT(*), COALESCE(MAX({}), 0) FROM {}", m.id, m.table),
            list_members: format!("{} ORDER BY {}", select_members, m.id),
            member_exists: format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE LOWER({}) = LOWER($1) AND LOWER({}) = LOWER($2))",
                m.table, m.name, m.surname
            ),
            lock_members: format!("LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE", m.table),
            insert_member: format!(
                "INSERT INTO {} ({}) VALUES ($1, $2, $3) RETURNING {}",
                m.table, member_cols, member_cols
            ),
            find_members_by_name: format!(
                "{} WHERE {} ORDER BY {}",
                select_members,
                contains(&m.name),
                m.id
            ),
            find_members_by_surname: format!(
                "{} WHERE {} ORDER BY {}",
                select_members,
                contains(&m.surname),
                m.id
            ),
            member_by_id: format!("{} WHERE {} = $1", select_members, m.id),
            member_for_update: format!(
                "SELECT {} FROM {} WHERE {} = $1 FOR UPDATE",
                m.id, m.table, m.id
            ),
            delete_member: format!("DELETE FROM {} WHERE {} = $1", m.table, m.id),

            loan_stats: format!("SELECT COUNT(*), COALESCE(MAX({}), 0) FROM {}", l.id, l.table),
            list_loans: format!("{} ORDER BY {}", select_loans, l.id),
            lock_loans: format!("LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE", l.table),
            insert_loan: format!(
                "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4) RETURNING {}",
                l.table, loan_cols, loan_cols
            ),
            loans_by_id: format!("{} WHERE {} = $1 ORDER BY {}", select_loans, l.id, l.id),
            loans_by_member: format!(
                "{} WHERE {} = $1 ORDER BY {}",
                select_loans, l.member_id, l.id
            ),
            loans_by_book: format!("{} WHERE {} = $1 ORDER BY {}", select_loans, l.book_id, l.id),
            loans_by_date: format!("{} WHERE {} = $1 ORDER BY {}", select_loans, l.loan_date, l.id),
            loan_books_for_update: format!(
                "SELECT {} FROM {} WHERE {} = $1 FOR UPDATE",
                l.book_id, l.table, l.id
            ),
            delete_loan: format!("DELETE FROM {} WHERE {} = $1", l.table, l.id),
            count_member_loans: format!(
                "SELECT COUNT(*) FROM {} WHERE {} = $1",
                l.table, l.member_id
            ),
            detailed_all: format!("{} ORDER BY lo.{}", detailed, l.id),
            detailed_by_id: detailed_where(&l.id),
            detailed_by_member: detailed_where(&l.member_id),
            detailed_by_book: detailed_where(&l.book_id),
            detailed_by_date: detailed_where(&l.loan_date),

            create_books: format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 {} INTEGER PRIMARY KEY, \
                 {} VARCHAR(255) NOT NULL, \
                 {} VARCHAR(255) NOT NULL, \
                 {} BOOLEAN NOT NULL DEFAULT FALSE)",
                b.table, b.id, b.title, b.author, b.lent
            ),
            create_members: format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 {} INTEGER PRIMARY KEY, \
                 {} VARCHAR(255) NOT NULL, \
                 {} VARCHAR(255) NOT NULL)",
                m.table, m.id, m.name, m.surname
            ),
            create_loans: format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 {} INTEGER PRIMARY KEY, \
                 {} INTEGER NOT NULL REFERENCES {} ({}), \
                 {} INTEGER NOT NULL REFERENCES {} ({}), \
                 {} DATE NOT NULL)",
                l.table, l.id, l.member_id, m.table, m.id, l.book_id, b.table, b.id, l.loan_date
            ),
        }
    }

    pub fn find_books(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.find_books_by_title,
            BookField::Author => &self.find_books_by_author,
        }
    }

    pub fn find_members(&self, field: MemberField) -> &str {
        match field {
            MemberField::Name => &self.find_members_by_name,
            MemberField::Surname => &self.find_members_by_surname,
        }
    }

    pub fn find_loans(&self, filter: &LoanFilter) -> &str {
        match filter {
            LoanFilter::Loan(_) => &self.loans_by_id,
            LoanFilter::Member(_) => &self.loans_by_member,
            LoanFilter::Book(_) => &self.loans_by_book,
            LoanFilter::Date(_) => &self.loans_by_date,
        }
    }

    pub fn find_loans_detailed(&self, filter: &LoanFilter) -> &str {
        match filter {
            LoanFilter::Loan(_) => &self.detailed_by_id,
            LoanFilter::Member(_) => &self.detailed_by_member,
            LoanFilter::Book(_) => &self.detailed_by_book,
            LoanFilter::Date(_) => &self.detailed_by_date,
        }
    }
}
