use crate::config::OutputFormat;
use crate::domain::{Book, InventoryError, Loan, LoanDetails, Member, TableStats};
use serde::Serialize;
use std::fmt::Write;

/// Formats service results for the console.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    format: OutputFormat,
}

#[derive(Serialize)]
struct Stats {
    books: TableStats,
    members: TableStats,
    loans: TableStats,
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }

    pub fn books(&self, books: &[Book]) -> String {
        if self.format == OutputFormat::Json {
            return self.json(books);
        }
        let mut out = format!("{:>5}  {:<32}  {:<24}  {}", "ID", "TITLE", "AUTHOR", "LENT");
        for book in books {
            let _ = write!(
                out,
                "\n{:>5}  {:<32}  {:<24}  {}",
                book.id,
                truncate(&book.title, 32),
                truncate(&book.author, 24),
                yes_no(book.lent)
            );
        }
        let _ = write!(out, "\n({} book(s))", books.len());
        out
    }

    pub fn members(&self, members: &[Member]) -> String {
        if self.format == OutputFormat::Json {
            return self.json(members);
        }
        let mut out = format!("{:>5}  {:<20}  {:<28}", "ID", "NAME", "SURNAME");
        for member in members {
            let _ = write!(
                out,
                "\n{:>5}  {:<20}  {:<28}",
                member.id,
                truncate(&member.name, 20),
                truncate(&member.surname, 28)
            );
        }
        let _ = write!(out, "\n({} member(s))", members.len());
        out
    }

    pub fn loans(&self, loans: &[Loan]) -> String {
        if self.format == OutputFormat::Json {
            return self.json(loans);
        }
        let mut out = format!("{:>5}  {:>7}  {:>7}  {}", "ID", "MEMBER", "BOOK", "DATE");
        for loan in loans {
            let _ = write!(
                out,
                "\n{:>5}  {:>7}  {:>7}  {}",
                loan.id, loan.member_id, loan.book_id, loan.date
            );
        }
        let _ = write!(out, "\n({} loan(s))", loans.len());
        out
    }

    pub fn loan_details(&self, loans: &[LoanDetails]) -> String {
        if self.format == OutputFormat::Json {
            return self.json(loans);
        }
        let mut out = format!(
            "{:>5}  {:<10}  {:<32}  {:<28}",
            "ID", "DATE", "BOOK", "MEMBER"
        );
        for details in loans {
            let _ = write!(
                out,
                "\n{:>5}  {:<10}  {:<32}  {:<28}",
                details.loan.id,
                details.loan.date,
                truncate(&format!("[{}] {}", details.book.id, details.book.title), 32),
                truncate(
                    &format!("[{}] {}", details.member.id, details.member.full_name()),
                    28
                )
            );
        }
        let _ = write!(out, "\n({} loan(s))", loans.len());
        out
    }

    pub fn book(&self, book: &Book) -> String {
        if self.format == OutputFormat::Json {
            return self.json(book);
        }
        format!(
            "book {}\n  title:  {}\n  author: {}\n  lent:   {}",
            book.id,
            book.title,
            book.author,
            yes_no(book.lent)
        )
    }

    pub fn member(&self, member: &Member) -> String {
        if self.format == OutputFormat::Json {
            return self.json(member);
        }
        format!(
            "member {}\n  name:    {}\n  surname: {}",
            member.id, member.name, member.surname
        )
    }

    pub fn loan(&self, loan: &Loan) -> String {
        if self.format == OutputFormat::Json {
            return self.json(loan);
        }
        format!(
            "loan {}: book {} lent to member {} on {}",
            loan.id, loan.book_id, loan.member_id, loan.date
        )
    }

    pub fn stats(&self, books: TableStats, members: TableStats, loans: TableStats) -> String {
        if self.format == OutputFormat::Json {
            return self.json(&Stats {
                books,
                members,
                loans,
            });
        }
        let row = |name: &str, s: TableStats| format!("{:<8} {:>6} {:>7}", name, s.count, s.max_id);
        format!(
            "{:<8} {:>6} {:>7}\n{}\n{}\n{}",
            "TABLE",
            "COUNT",
            "MAX ID",
            row("books", books),
            row("members", members),
            row("loans", loans)
        )
    }

    pub fn message(&self, text: &str) -> String {
        if self.format == OutputFormat::Json {
            return serde_json::json!({ "message": text }).to_string();
        }
        text.to_string()
    }

    pub fn warning(&self, text: &str) -> String {
        if self.format == OutputFormat::Json {
            return serde_json::json!({ "warning": text }).to_string();
        }
        format!("warning: {}", text)
    }

    pub fn error(&self, error: &dyn std::fmt::Display) -> String {
        if self.format == OutputFormat::Json {
            return serde_json::json!({ "error": error.to_string() }).to_string();
        }
        format!("error: {}", error)
    }

    pub fn inventory_error(&self, error: &InventoryError) -> String {
        match error {
            // backend detail goes to the log, not the screen
            InventoryError::StorageError(source) => {
                tracing::error!("Storage error: {}", source);
                self.error(&"the database is unavailable, try again later")
            }
            other => self.error(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookId, LoanId, MemberId};
    use chrono::NaiveDate;

    fn dune() -> Book {
        Book {
            id: BookId::new(1),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            lent: true,
        }
    }

    #[test]
    fn test_table_lists_rows_and_count() {
        let out = Renderer::new(OutputFormat::Table).books(&[dune()]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("TITLE"));
        assert!(lines[1].contains("Dune"));
        assert!(lines[1].ends_with("yes"));
        assert_eq!(lines[2], "(1 book(s))");
    }

    #[test]
    fn test_json_output_is_parseable() {
        let out = Renderer::new(OutputFormat::Json).books(&[dune()]);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["title"], "Dune");
        assert_eq!(value[0]["lent"], true);
    }

    #[test]
    fn test_loan_line() {
        let loan = Loan {
            id: LoanId::new(1),
            member_id: MemberId::new(2),
            book_id: BookId::new(3),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };
        assert_eq!(
            Renderer::new(OutputFormat::Table).loan(&loan),
            "loan 1: book 3 lent to member 2 on 2024-06-01"
        );
    }

    #[test]
    fn test_long_text_is_truncated() {
        assert_eq!(truncate("abcdef", 4), "abc~");
        assert_eq!(truncate("abc", 4), "abc");
    }

    #[test]
    fn test_storage_errors_are_not_shown_verbatim() {
        let renderer = Renderer::new(OutputFormat::Table);
        let out =
            renderer.inventory_error(&InventoryError::storage("password authentication failed"));
        assert!(!out.contains("password"));

        let out = renderer.inventory_error(&InventoryError::AlreadyLent(BookId::new(4)));
        assert_eq!(out, "error: book 4 is already lent");

        let out = renderer.inventory_error(&InventoryError::Conflict("deadlock detected".into()));
        assert_eq!(out, "error: conflicting concurrent update: deadlock detected");
    }

    #[test]
    fn test_stats_json() {
        let out = Renderer::new(OutputFormat::Json).stats(
            TableStats { count: 1, max_id: 1 },
            TableStats::EMPTY,
            TableStats::EMPTY,
        );
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["books"]["max_id"], 1);
        assert_eq!(value["loans"]["count"], 0);
    }
}
