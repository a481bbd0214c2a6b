//! Command definitions and their terminal output.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use bookbuddy_core::books::{DEFAULT_LIMIT, DEFAULT_PAGE, DEFAULT_TOP_K};
use bookbuddy_core::models::{Book, BookRecommendation, ContextBook, FollowUpAnswer};
use bookbuddy_core::utils::format_optional;
use bookbuddy_core::BookBuddy;

#[derive(Debug, Parser)]
#[command(name = "bookbuddy", version, about = "Book recommendations from the BookBuddy librarian")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login {
        email: String,
        /// Password (prompted for when not given)
        #[arg(long, env = "BOOKBUDDY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        email: String,
        #[arg(long, env = "BOOKBUDDY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out and forget stored tokens
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Ask for recommendations in plain language
    Search {
        question: String,
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Show one book
    Book { id: String },
    /// Ask a follow-up question, optionally about specific books
    Ask {
        question: String,
        /// Book id to include as context (repeatable)
        #[arg(long = "book")]
        books: Vec<String>,
    },
    /// List books in a genre
    Genre {
        genre: String,
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },
    /// List the catalog
    Books {
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },
    /// Print the URL that starts Google sign-in
    OauthUrl,
    /// Finish Google sign-in from the URL the browser was sent back to
    OauthCallback { url: String },
}

pub async fn run(client: &BookBuddy, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let password = password_or_prompt(password)?;
            client.session.login(&email, &password).await?;
            match client.session.user() {
                Some(user) => println!("Signed in as {}", user.display_name()),
                None => println!("Login accepted, but no session was issued"),
            }
        }
        Command::Register { email, password } => {
            let password = password_or_prompt(password)?;
            client.session.register(&email, &password).await?;
            println!("Account created for {}. Run `bookbuddy login {}` to sign in.", email, email);
        }
        Command::Logout => {
            client.session.logout();
            println!("Signed out");
        }
        Command::Whoami => match client.session.user() {
            Some(user) => {
                println!("{}", user.display_name());
                for (key, value) in &user.extra {
                    println!("  {}: {}", key, value);
                }
            }
            None => println!("Not signed in"),
        },
        Command::Search { question, top_k } => {
            let books = client.books.search(&question, top_k).await?;
            print_recommendations(&books);
        }
        Command::Book { id } => {
            let book = client.books.get_by_id(&id).await?;
            print_book(&book);
        }
        Command::Ask { question, books } => {
            let context: Vec<ContextBook> = books.iter().map(|id| ContextBook::from_id(id)).collect();
            let answer = client.books.ask_follow_up(&question, &context).await?;
            print_answer(&answer);
        }
        Command::Genre { genre, page, limit } => {
            let books = client.books.list_by_genre(&genre, page, limit).await?;
            print_book_list(&books);
        }
        Command::Books { page, limit } => {
            let books = client.books.list_books(page, limit).await?;
            print_book_list(&books);
        }
        Command::OauthUrl => println!("{}", client.session.oauth_login_url()),
        Command::OauthCallback { url } => {
            if client.session.complete_oauth_callback(&url).await {
                match client.session.user() {
                    Some(user) => println!("Signed in as {}", user.display_name()),
                    None => println!("Tokens stored, but the session could not be loaded"),
                }
            } else {
                anyhow::bail!("No access token found in callback URL");
            }
        }
    }
    Ok(())
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("Password: ").context("Failed to read password"),
    }
}

fn print_recommendations(books: &[BookRecommendation]) {
    if books.is_empty() {
        println!("No matching books found.");
        return;
    }
    // Every card carries the same answer; print it once.
    if let Some(first) = books.first() {
        if !first.answer.is_empty() {
            println!("{}\n", first.answer);
        }
    }
    for (i, book) in books.iter().enumerate() {
        println!("{}. {} by {} [{}] ({:.1})", i + 1, book.title, book.author, book.category, book.rating);
        println!("   {}", book.short_reason);
        println!("   id: {}", book.id);
    }
    print_citations(&books[0].citations);
}

fn print_book(book: &Book) {
    println!("{}", book.title);
    println!("by {}", book.author);
    println!("Genres: {}", format_optional(&book.genres, "-"));
    if let Some(pages) = book.num_pages {
        println!("Pages: {}", pages);
    }
    if let Some(ref description) = book.description {
        println!("\n{}", description);
    }
}

fn print_book_list(books: &[Book]) {
    if books.is_empty() {
        println!("No books found.");
        return;
    }
    for book in books {
        println!(
            "{}  {} by {}",
            format_optional(&book.book_id, "?"),
            book.title,
            book.author
        );
    }
}

fn print_answer(answer: &FollowUpAnswer) {
    println!("{}", answer.answer);
    print_citations(&answer.citations);
}

fn print_citations(citations: &std::collections::BTreeMap<String, String>) {
    if citations.is_empty() {
        return;
    }
    println!("\nSources:");
    for (label, book_id) in citations {
        println!("  {} {}", label, book_id);
    }
}
