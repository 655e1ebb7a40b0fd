use crate::application::sort::{BookOrder, LoanDetailsOrder, LoanOrder, MemberOrder};
use crate::domain::{BookField, BookId, LoanFilter, LoanId, MemberField, MemberId};
use chrono::NaiveDate;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  books [id|title|author]                 list books
  book add <title> | <author>             add a book
  book find <title|author> <text>         search books
  book show <id>                          show one book
  book delete <id>                        delete a book that is not lent
  members [id|name|surname]               list members
  member add <name> | <surname>           add a member
  member find <name|surname> <text>       search members
  member show <id>                        show one member
  member delete <id>                      delete a member without loans
  loans [id|date|member|book]             list loans
  loans detailed [id|date|member|book|title|surname]
                                          list loans with book and member
  loan add <member_id> <book_id>          lend a book
  loan find <id|member|book|date> <value> search loans (date: YYYY-MM-DD)
  loan return <id>                        return a loan
  stats                                   row counts and max ids
  help                                    this text
  quit                                    leave";

/// One console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Stats,
    ListBooks(BookOrder),
    AddBook { title: String, author: String },
    FindBooks(BookField, String),
    ShowBook(BookId),
    DeleteBook(BookId),
    ListMembers(MemberOrder),
    AddMember { name: String, surname: String },
    FindMembers(MemberField, String),
    ShowMember(MemberId),
    DeleteMember(MemberId),
    ListLoans(LoanOrder),
    ListLoansDetailed(LoanDetailsOrder),
    AddLoan { member_id: MemberId, book_id: BookId },
    FindLoans(LoanFilter),
    ReturnLoan(LoanId),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0} (try `help`)")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("not a valid id: {0}")]
    InvalidId(String),
    #[error("not a valid date (YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("unknown field: {0}")]
    UnknownField(String),
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    }
}

fn parse_id(raw: &str) -> Result<i32, ParseError> {
    raw.parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ParseError::InvalidId(raw.to_string()))
}

fn single_id(rest: &str, usage: &'static str) -> Result<i32, ParseError> {
    let (id, extra) = split_word(rest);
    if id.is_empty() || !extra.is_empty() {
        return Err(ParseError::Usage(usage));
    }
    parse_id(id)
}

/// Split `<first> | <second>` into two non-empty parts.
fn pair(rest: &str, usage: &'static str) -> Result<(String, String), ParseError> {
    let (first, second) = rest.split_once('|').ok_or(ParseError::Usage(usage))?;
    let (first, second) = (first.trim(), second.trim());
    if first.is_empty() || second.is_empty() || second.contains('|') {
        return Err(ParseError::Usage(usage));
    }
    Ok((first.to_string(), second.to_string()))
}

fn search<F: std::str::FromStr>(
    rest: &str,
    usage: &'static str,
) -> Result<(F, String), ParseError> {
    let (field, text) = split_word(rest);
    if field.is_empty() || text.is_empty() {
        return Err(ParseError::Usage(usage));
    }
    let field = field
        .parse::<F>()
        .map_err(|_| ParseError::UnknownField(field.to_string()))?;
    Ok((field, text.to_string()))
}

fn book_order(word: &str) -> Result<BookOrder, ParseError> {
    match word {
        "" | "id" => Ok(BookOrder::Id),
        "title" => Ok(BookOrder::Title),
        "author" => Ok(BookOrder::Author),
        other => Err(ParseError::UnknownField(other.to_string())),
    }
}

fn member_order(word: &str) -> Result<MemberOrder, ParseError> {
    match word {
        "" | "id" => Ok(MemberOrder::Id),
        "name" => Ok(MemberOrder::Name),
        "surname" => Ok(MemberOrder::Surname),
        other => Err(ParseError::UnknownField(other.to_string())),
    }
}

fn loan_order(word: &str) -> Result<LoanOrder, ParseError> {
    match word {
        "" | "id" => Ok(LoanOrder::Id),
        "date" => Ok(LoanOrder::Date),
        "member" => Ok(LoanOrder::Member),
        "book" => Ok(LoanOrder::Book),
        other => Err(ParseError::UnknownField(other.to_string())),
    }
}

fn loan_details_order(word: &str) -> Result<LoanDetailsOrder, ParseError> {
    match word {
        "" | "id" => Ok(LoanDetailsOrder::Id),
        "date" => Ok(LoanDetailsOrder::Date),
        "member" => Ok(LoanDetailsOrder::Member),
        "book" => Ok(LoanDetailsOrder::Book),
        "title" => Ok(LoanDetailsOrder::Title),
        "surname" => Ok(LoanDetailsOrder::Surname),
        other => Err(ParseError::UnknownField(other.to_string())),
    }
}

fn loan_filter(rest: &str) -> Result<LoanFilter, ParseError> {
    const USAGE: &str = "loan find <id|member|book|date> <value>";
    let (field, value) = split_word(rest);
    if field.is_empty() || value.is_empty() {
        return Err(ParseError::Usage(USAGE));
    }
    match field {
        "id" => Ok(LoanFilter::Loan(LoanId::new(parse_id(value)?))),
        "member" => Ok(LoanFilter::Member(MemberId::new(parse_id(value)?))),
        "book" => Ok(LoanFilter::Book(BookId::new(parse_id(value)?))),
        "date" => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(LoanFilter::Date)
            .map_err(|_| ParseError::InvalidDate(value.to_string())),
        other => Err(ParseError::UnknownField(other.to_string())),
    }
}

fn parse_book(rest: &str) -> Result<Command, ParseError> {
    let (sub, rest) = split_word(rest);
    match sub {
        "add" => {
            let (title, author) = pair(rest, "book add <title> | <author>")?;
            Ok(Command::AddBook { title, author })
        }
        "find" => {
            let (field, text) = search(rest, "book find <title|author> <text>")?;
            Ok(Command::FindBooks(field, text))
        }
        "show" => Ok(Command::ShowBook(BookId::new(single_id(
            rest,
            "book show <id>",
        )?))),
        "delete" => Ok(Command::DeleteBook(BookId::new(single_id(
            rest,
            "book delete <id>",
        )?))),
        _ => Err(ParseError::Usage("book <add|find|show|delete> ...")),
    }
}

fn parse_member(rest: &str) -> Result<Command, ParseError> {
    let (sub, rest) = split_word(rest);
    match sub {
        "add" => {
            let (name, surname) = pair(rest, "member add <name> | <surname>")?;
            Ok(Command::AddMember { name, surname })
        }
        "find" => {
            let (field, text) = search(rest, "member find <name|surname> <text>")?;
            Ok(Command::FindMembers(field, text))
        }
        "show" => Ok(Command::ShowMember(MemberId::new(single_id(
            rest,
            "member show <id>",
        )?))),
        "delete" => Ok(Command::DeleteMember(MemberId::new(single_id(
            rest,
            "member delete <id>",
        )?))),
        _ => Err(ParseError::Usage("member <add|find|show|delete> ...")),
    }
}

fn parse_loan(rest: &str) -> Result<Command, ParseError> {
    let (sub, rest) = split_word(rest);
    match sub {
        "add" => {
            const USAGE: &str = "loan add <member_id> <book_id>";
            let (member, rest) = split_word(rest);
            let (book, extra) = split_word(rest);
            if member.is_empty() || book.is_empty() || !extra.is_empty() {
                return Err(ParseError::Usage(USAGE));
            }
            Ok(Command::AddLoan {
                member_id: MemberId::new(parse_id(member)?),
                book_id: BookId::new(parse_id(book)?),
            })
        }
        "find" => Ok(Command::FindLoans(loan_filter(rest)?)),
        "return" => Ok(Command::ReturnLoan(LoanId::new(single_id(
            rest,
            "loan return <id>",
        )?))),
        _ => Err(ParseError::Usage("loan <add|find|return> ...")),
    }
}

/// Parse one input line.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let (head, rest) = split_word(line);
    match head.to_ascii_lowercase().as_str() {
        "" => Err(ParseError::Empty),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "stats" => Ok(Command::Stats),
        "books" => Ok(Command::ListBooks(book_order(rest)?)),
        "members" => Ok(Command::ListMembers(member_order(rest)?)),
        "loans" => {
            let (first, order) = split_word(rest);
            if first == "detailed" {
                Ok(Command::ListLoansDetailed(loan_details_order(order)?))
            } else {
                Ok(Command::ListLoans(loan_order(rest)?))
            }
        }
        "book" => parse_book(rest),
        "member" => parse_member(rest),
        "loan" => parse_loan(rest),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("help"), Ok(Command::Help));
        assert_eq!(parse("  QUIT "), Ok(Command::Quit));
        assert_eq!(parse("stats"), Ok(Command::Stats));
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert!(matches!(parse("fly"), Err(ParseError::UnknownCommand(_))));
    }

    #[test]
    fn test_parse_book_add_splits_on_pipe() {
        assert_eq!(
            parse("book add The Left Hand of Darkness | Ursula K. Le Guin"),
            Ok(Command::AddBook {
                title: "The Left Hand of Darkness".to_string(),
                author: "Ursula K. Le Guin".to_string(),
            })
        );
        assert!(matches!(parse("book add Dune"), Err(ParseError::Usage(_))));
        assert!(matches!(parse("book add | Herbert"), Err(ParseError::Usage(_))));
        assert!(matches!(parse("book add a | b | c"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn test_parse_listing_orders() {
        assert_eq!(parse("books"), Ok(Command::ListBooks(BookOrder::Id)));
        assert_eq!(parse("books author"), Ok(Command::ListBooks(BookOrder::Author)));
        assert_eq!(
            parse("members surname"),
            Ok(Command::ListMembers(MemberOrder::Surname))
        );
        assert_eq!(parse("loans date"), Ok(Command::ListLoans(LoanOrder::Date)));
        assert_eq!(
            parse("loans detailed title"),
            Ok(Command::ListLoansDetailed(LoanDetailsOrder::Title))
        );
        assert_eq!(
            parse("loans detailed"),
            Ok(Command::ListLoansDetailed(LoanDetailsOrder::Id))
        );
        assert!(matches!(parse("books isbn"), Err(ParseError::UnknownField(_))));
    }

    #[test]
    fn test_parse_searches() {
        assert_eq!(
            parse("book find title left hand"),
            Ok(Command::FindBooks(BookField::Title, "left hand".to_string()))
        );
        assert_eq!(
            parse("member find surname love"),
            Ok(Command::FindMembers(MemberField::Surname, "love".to_string()))
        );
        assert!(matches!(
            parse("book find isbn 123"),
            Err(ParseError::UnknownField(_))
        ));
        assert!(matches!(parse("book find title"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn test_parse_loan_commands() {
        assert_eq!(
            parse("loan add 1 2"),
            Ok(Command::AddLoan {
                member_id: MemberId::new(1),
                book_id: BookId::new(2),
            })
        );
        assert_eq!(parse("loan return 3"), Ok(Command::ReturnLoan(LoanId::new(3))));
        assert_eq!(
            parse("loan find date 2024-02-29"),
            Ok(Command::FindLoans(LoanFilter::Date(
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
            )))
        );
        assert_eq!(
            parse("loan find member 4"),
            Ok(Command::FindLoans(LoanFilter::Member(MemberId::new(4))))
        );
        assert!(matches!(
            parse("loan find date 29/02/2024"),
            Err(ParseError::InvalidDate(_))
        ));
        assert!(matches!(parse("loan add 1"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn test_ids_must_be_positive_integers() {
        assert!(matches!(parse("book show x"), Err(ParseError::InvalidId(_))));
        assert!(matches!(parse("book delete 0"), Err(ParseError::InvalidId(_))));
        assert!(matches!(parse("member show -2"), Err(ParseError::InvalidId(_))));
        assert!(matches!(parse("member show 1 2"), Err(ParseError::Usage(_))));
        assert_eq!(parse("member show 2"), Ok(Command::ShowMember(MemberId::new(2))));
    }
}
