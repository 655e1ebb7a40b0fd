//! Line-oriented console over the inventory service.

pub mod command;
pub mod render;

use crate::application::inventory::{self, ReadOutcome, ServiceDependencies};
use crate::application::sort;
use crate::config::{AppConfig, ValidationConfig};
use crate::domain::{commands::*, normalize_text};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub use command::{Command, HELP, ParseError, parse};
pub use render::Renderer;

const PROMPT: &str = "library> ";

/// What the console should do after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Quit,
}

pub struct Console {
    deps: ServiceDependencies,
    validation: ValidationConfig,
    renderer: Renderer,
}

/// Reject text that is empty after normalization or longer than `max` chars.
fn check_len(field: &str, value: &str, max: usize) -> Result<(), String> {
    let len = normalize_text(value).chars().count();
    if len == 0 {
        Err(format!("{} must not be empty", field))
    } else if len > max {
        Err(format!("{} is longer than {} characters", field, max))
    } else {
        Ok(())
    }
}

impl Console {
    pub fn new(deps: ServiceDependencies, config: &AppConfig) -> Self {
        Self {
            deps,
            validation: config.validation.clone(),
            renderer: Renderer::new(config.console.format),
        }
    }

    /// Render a soft read, prefixing a warning line when it fell back.
    fn soft<T>(
        &self,
        outcome: ReadOutcome<T>,
        what: &str,
        render: impl FnOnce(&T) -> String,
    ) -> String {
        let (value, error) = outcome.into_parts();
        let body = render(&value);
        match error {
            Some(_) => format!(
                "{}\n{}",
                self.renderer
                    .warning(&format!("could not read {}, showing a fallback", what)),
                body
            ),
            None => body,
        }
    }

    pub async fn handle_line(&self, line: &str) -> Reply {
        let command = match parse(line) {
            Ok(command) => command,
            Err(ParseError::Empty) => return Reply::Output(String::new()),
            Err(e) => return Reply::Output(self.renderer.error(&e)),
        };
        tracing::debug!(?command, "console command");

        let r = &self.renderer;
        let deps = &self.deps;
        let out = match command {
            Command::Quit => return Reply::Quit,
            Command::Help => HELP.to_string(),
            Command::Stats => {
                let books = inventory::count_books(deps).await;
                let members = inventory::count_members(deps).await;
                let loans = inventory::count_loans(deps).await;
                let degraded =
                    books.is_degraded() || members.is_degraded() || loans.is_degraded();
                let body = r.stats(books.into_value(), members.into_value(), loans.into_value());
                if degraded {
                    format!("{}\n{}", r.warning("some counts could not be read"), body)
                } else {
                    body
                }
            }
            Command::ListBooks(order) => {
                let outcome = inventory::list_books(deps).await.map(|mut books| {
                    sort::sort_books(&mut books, order);
                    books
                });
                self.soft(outcome, "books", |books| r.books(books))
            }
            Command::ListMembers(order) => {
                let outcome = inventory::list_members(deps).await.map(|mut members| {
                    sort::sort_members(&mut members, order);
                    members
                });
                self.soft(outcome, "members", |members| r.members(members))
            }
            Command::ListLoans(order) => {
                let outcome = inventory::list_loans(deps).await.map(|mut loans| {
                    sort::sort_loans(&mut loans, order);
                    loans
                });
                self.soft(outcome, "loans", |loans| r.loans(loans))
            }
            Command::ListLoansDetailed(order) => {
                let outcome = inventory::list_loans_detailed(deps).await.map(|mut loans| {
                    sort::sort_loan_details(&mut loans, order);
                    loans
                });
                self.soft(outcome, "loans", |loans| r.loan_details(loans))
            }
            Command::AddBook { title, author } => {
                let checked = check_len("title", &title, self.validation.title_max_len)
                    .and_then(|_| check_len("author", &author, self.validation.author_max_len));
                match checked {
                    Err(message) => r.error(&message),
                    Ok(()) => match inventory::add_book(deps, AddBook { title, author }).await {
                        Ok(book) => r.book(&book),
                        Err(e) => r.inventory_error(&e),
                    },
                }
            }
            Command::AddMember { name, surname } => {
                let checked = check_len("name", &name, self.validation.name_max_len)
                    .and_then(|_| check_len("surname", &surname, self.validation.surname_max_len));
                match checked {
                    Err(message) => r.error(&message),
                    Ok(()) => match inventory::add_member(deps, AddMember { name, surname }).await
                    {
                        Ok(member) => r.member(&member),
                        Err(e) => r.inventory_error(&e),
                    },
                }
            }
            Command::FindBooks(field, text) => match inventory::find_books(deps, field, &text).await
            {
                Ok(books) => r.books(&books),
                Err(e) => r.inventory_error(&e),
            },
            Command::FindMembers(field, text) => {
                match inventory::find_members(deps, field, &text).await {
                    Ok(members) => r.members(&members),
                    Err(e) => r.inventory_error(&e),
                }
            }
            Command::ShowBook(id) => match inventory::find_book(deps, id).await {
                Ok(book) => r.book(&book),
                Err(e) => r.inventory_error(&e),
            },
            Command::ShowMember(id) => match inventory::find_member(deps, id).await {
                Ok(member) => r.member(&member),
                Err(e) => r.inventory_error(&e),
            },
            Command::DeleteBook(book_id) => {
                match inventory::delete_book(deps, DeleteBook { book_id }).await {
                    Ok(max_id) => {
                        r.message(&format!("book {} deleted (max id {})", book_id, max_id))
                    }
                    Err(e) => r.inventory_error(&e),
                }
            }
            Command::DeleteMember(member_id) => {
                match inventory::delete_member(deps, DeleteMember { member_id }).await {
                    Ok(max_id) => {
                        r.message(&format!("member {} deleted (max id {})", member_id, max_id))
                    }
                    Err(e) => r.inventory_error(&e),
                }
            }
            Command::AddLoan { member_id, book_id } => {
                match inventory::add_loan(deps, AddLoan { member_id, book_id }).await {
                    Ok(loan) => r.loan(&loan),
                    Err(e) => r.inventory_error(&e),
                }
            }
            Command::FindLoans(filter) => match inventory::find_loans_detailed(deps, filter).await {
                Ok(loans) => r.loan_details(&loans),
                Err(e) => r.inventory_error(&e),
            },
            Command::ReturnLoan(loan_id) => {
                match inventory::return_loan(deps, ReturnLoan { loan_id }).await {
                    Ok(max_id) => {
                        r.message(&format!("loan {} returned (max id {})", loan_id, max_id))
                    }
                    Err(e) => r.inventory_error(&e),
                }
            }
        };
        Reply::Output(out)
    }

    /// Read commands line by line until `quit` or end of input.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            match self.handle_line(&line).await {
                Reply::Quit => break,
                Reply::Output(text) if text.is_empty() => {}
                Reply::Output(text) => {
                    output.write_all(text.as_bytes()).await?;
                    output.write_all(b"\n").await?;
                }
            }
        }
        output.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{CatalogStore, InMemoryDatabase, LoanLedger};
    use crate::config::OutputFormat;
    use std::sync::Arc;

    fn console_with(config: &AppConfig) -> (Console, InMemoryDatabase) {
        let db = InMemoryDatabase::new();
        let deps = ServiceDependencies::new(
            Arc::new(CatalogStore::new(db.clone(), config.limits.max_members)),
            Arc::new(LoanLedger::new(db.clone(), config.limits.max_loans_per_member)),
        );
        (Console::new(deps, config), db)
    }

    fn console() -> (Console, InMemoryDatabase) {
        console_with(&AppConfig::default())
    }

    async fn output(console: &Console, line: &str) -> String {
        match console.handle_line(line).await {
            Reply::Output(text) => text,
            Reply::Quit => panic!("unexpected quit for {:?}", line),
        }
    }

    #[tokio::test]
    async fn test_lend_and_return_through_console() {
        let (console, _db) = console();

        assert!(output(&console, "book add Dune | Frank Herbert").await.starts_with("book 1"));
        assert!(output(&console, "member add Ada | Lovelace").await.starts_with("member 1"));

        let lent = output(&console, "loan add 1 1").await;
        assert!(lent.starts_with("loan 1: book 1 lent to member 1"), "{}", lent);
        assert!(output(&console, "book show 1").await.contains("lent:   yes"));

        let again = output(&console, "loan add 1 1").await;
        assert_eq!(again, "error: book 1 is already lent");

        assert_eq!(
            output(&console, "loan return 1").await,
            "loan 1 returned (max id 0)"
        );
        assert!(output(&console, "book show 1").await.contains("lent:   no"));
    }

    #[tokio::test]
    async fn test_parse_errors_are_reported() {
        let (console, _db) = console();
        assert!(output(&console, "book add Dune").await.starts_with("error: usage"));
        assert_eq!(output(&console, "   ").await, "");
        assert_eq!(console.handle_line("quit").await, Reply::Quit);
    }

    #[tokio::test]
    async fn test_text_length_is_validated_before_insert() {
        let mut config = AppConfig::default();
        config.validation.title_max_len = 4;
        let (console, _db) = console_with(&config);

        let out = output(&console, "book add Foundation | Isaac Asimov").await;
        assert_eq!(out, "error: title is longer than 4 characters");
        assert!(output(&console, "books").await.ends_with("(0 book(s))"));
    }

    #[tokio::test]
    async fn test_sorted_listing() {
        let (console, _db) = console();
        output(&console, "book add Zen | Pirsig").await;
        output(&console, "book add alpha | Author").await;

        let listing = output(&console, "books title").await;
        let alpha = listing.find("alpha").unwrap();
        let zen = listing.find("Zen").unwrap();
        assert!(alpha < zen);
    }

    #[tokio::test]
    async fn test_offline_listing_warns_and_shows_fallback() {
        let (console, db) = console();
        db.set_offline(true);

        let out = output(&console, "books").await;
        assert!(out.starts_with("warning: could not read books"));
        assert!(out.ends_with("(0 book(s))"));

        let stats = output(&console, "stats").await;
        assert!(stats.starts_with("warning:"));

        let write = output(&console, "book add Dune | Frank Herbert").await;
        assert_eq!(write, "error: the database is unavailable, try again later");
    }

    #[tokio::test]
    async fn test_json_format() {
        let mut config = AppConfig::default();
        config.console.format = OutputFormat::Json;
        let (console, _db) = console_with(&config);

        let out = output(&console, "member add Ada | Lovelace").await;
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["surname"], "Lovelace");

        let out = output(&console, "member show 9").await;
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["error"], "no member matches id 9");
    }

    #[tokio::test]
    async fn test_run_reads_until_quit() {
        let (console, _db) = console();
        let input: &[u8] = b"book add Dune | Frank Herbert\nbooks\nquit\nbooks\n";
        let mut out = Vec::new();

        console.run(input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("book 1\n  title:  Dune"));
        assert_eq!(text.matches("(1 book(s))").count(), 1);
        assert_eq!(text.matches(PROMPT).count(), 3);
    }
}
