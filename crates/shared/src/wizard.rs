//! First-run setup and interactive interest entry.
//!
//! Every prompt goes through a caller-supplied reader/writer pair instead of
//! touching stdin directly, so the whole flow can be driven by a scripted
//! sequence of answers in tests. Invalid answers re-prompt; nothing here is
//! fatal except the input stream ending mid-setup.

use anyhow::{bail, Result};
use std::io::{BufRead, Write};

use crate::config::ConfigStore;
use crate::interest::{InterestError, InterestFilter, QueryCategory};

/// Everything the first-run wizard collects. `None` fields fall back to
/// defaults chosen by the caller (sender address for email, standard
/// subject for the title).
#[derive(Debug, Clone, PartialEq)]
pub struct SetupAnswers {
    pub name: String,
    pub email: Option<String>,
    pub notification_schedule: Option<f64>,
    pub email_title: Option<String>,
    pub interests: Vec<InterestFilter>,
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, text: &str) -> Result<Option<String>> {
    write!(output, "{text}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Shape check in the spirit of `local@domain.tld`: one '@', a dot in the
/// domain with something on both sides. Deliberately loose.
fn valid_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn print_category_help<W: Write>(output: &mut W) -> Result<()> {
    writeln!(output, "Invalid category! Please choose from the following:")?;
    for name in QueryCategory::NAMES {
        writeln!(output, "{name}")?;
    }
    Ok(())
}

/// Read "category:query" lines until a blank one, reporting and discarding
/// anything that does not parse.
fn collect_interests<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<Vec<InterestFilter>> {
    let mut interests = Vec::new();
    loop {
        let Some(line) = prompt(input, output, "Enter an interest in the form 'category:query': ")?
        else {
            break;
        };
        if line.trim().is_empty() {
            break;
        }
        match InterestFilter::parse(&line) {
            Ok(filter) => interests.push(filter),
            Err(InterestError::UnknownCategory(_)) => print_category_help(output)?,
            Err(InterestError::MissingQuery) => {
                writeln!(output, "Please use the form 'category:query'.")?;
            }
        }
    }
    Ok(interests)
}

/// Run the first-run setup sequence: name, email, notification frequency,
/// email subject, then interests until a blank line.
pub fn run_setup<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<SetupAnswers> {
    let name = loop {
        let Some(line) = prompt(input, output, "Enter your name: ")? else {
            bail!("Input ended before setup completed");
        };
        let line = line.trim().to_string();
        if !line.is_empty() {
            break line;
        }
    };

    let mut email_prompt = "Enter your email address: ";
    let email = loop {
        let Some(line) = prompt(input, output, email_prompt)? else {
            break None;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            break None;
        }
        if valid_email(&line) {
            break Some(line);
        }
        email_prompt = "Enter a VALID email address: ";
    };

    let notification_schedule = loop {
        let Some(line) = prompt(
            input,
            output,
            "How often would you like to be notified? (frequency in days): ",
        )?
        else {
            break None;
        };
        let line = line.trim();
        if line.is_empty() {
            break None;
        }
        match line.parse::<f64>() {
            // Negative is the "no fixed schedule, always query" sentinel.
            Ok(days) if days < 0.0 => break None,
            Ok(days) => break Some(days),
            Err(_) => {
                writeln!(
                    output,
                    "Please enter a number of days (or -1 for no fixed schedule)."
                )?;
            }
        }
    };

    let email_title = prompt(
        input,
        output,
        "Enter a title for the notification email (optional): ",
    )?
    .map(|line| line.trim().to_string())
    .filter(|line| !line.is_empty());

    let interests = collect_interests(input, output)?;

    Ok(SetupAnswers {
        name,
        email,
        notification_schedule,
        email_title,
        interests,
    })
}

/// Interactive interest management (`--interests`). Plain lines are parsed
/// as new interests; `list` prints the current table and `remove <id>`
/// drops one. A blank line ends the session.
pub fn run_interest_session<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    store: &mut ConfigStore,
) -> Result<()> {
    loop {
        let Some(line) = prompt(
            input,
            output,
            "Enter an interest in the form 'category:query' (or 'list', 'remove <id>'): ",
        )?
        else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        if line == "list" {
            writeln!(output, "ID\tCAT\tQUERY")?;
            for (id, interest) in store.config().interests.iter().enumerate() {
                writeln!(output, "{id}\t{}\t{}", interest.category.code(), interest.query)?;
            }
            continue;
        }

        if let Some(id) = line.strip_prefix("remove ") {
            match id.trim().parse::<usize>().ok().and_then(|id| store.remove_interest(id)) {
                Some(removed) => writeln!(
                    output,
                    "Removed {}:{}",
                    removed.category.code(),
                    removed.query
                )?,
                None => writeln!(output, "No interest with that id.")?,
            }
            continue;
        }

        match InterestFilter::parse(line) {
            Ok(filter) => store.register_interest(filter),
            Err(InterestError::UnknownCategory(_)) => print_category_help(output)?,
            Err(InterestError::MissingQuery) => {
                writeln!(output, "Please use the form 'category:query'.")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(script: &str) -> (SetupAnswers, String) {
        let mut input = Cursor::new(script.to_string());
        let mut output = Vec::new();
        let answers = run_setup(&mut input, &mut output).unwrap();
        (answers, String::from_utf8(output).unwrap())
    }

    #[test]
    fn full_scripted_setup() {
        let (answers, output) = run(
            "Ada\nada@example.com\n3\nWeekly Papers\nti:bandits\nbogus:x\nall:quantum\n\n",
        );
        assert_eq!(answers.name, "Ada");
        assert_eq!(answers.email.as_deref(), Some("ada@example.com"));
        assert_eq!(answers.notification_schedule, Some(3.0));
        assert_eq!(answers.email_title.as_deref(), Some("Weekly Papers"));
        assert_eq!(answers.interests.len(), 2);
        assert!(output.contains("Invalid category!"));
        assert!(output.contains("journalreference"));
    }

    #[test]
    fn empty_name_is_reprompted() {
        let (answers, output) = run("\n  \nAda\n\n\n\n\n");
        assert_eq!(answers.name, "Ada");
        assert_eq!(output.matches("Enter your name: ").count(), 3);
    }

    #[test]
    fn invalid_email_is_reprompted_blank_falls_through() {
        let (answers, output) = run("Ada\nnot-an-email\n\n\n\n\n");
        assert_eq!(answers.email, None);
        assert!(output.contains("Enter a VALID email address: "));
    }

    #[test]
    fn negative_frequency_means_no_schedule() {
        let (answers, _) = run("Ada\n\n-1\n\n\n");
        assert_eq!(answers.notification_schedule, None);
    }

    #[test]
    fn fractional_frequency_is_kept() {
        let (answers, _) = run("Ada\n\n0.5\n\n\n");
        assert_eq!(answers.notification_schedule, Some(0.5));
    }

    #[test]
    fn non_numeric_frequency_is_reprompted() {
        let (answers, output) = run("Ada\n\noften\n2\n\n\n");
        assert_eq!(answers.notification_schedule, Some(2.0));
        assert!(output.contains("Please enter a number of days"));
    }

    #[test]
    fn blank_optional_answers_become_defaults() {
        let (answers, _) = run("Ada\n\n\n\n\n");
        assert_eq!(answers.email, None);
        assert_eq!(answers.notification_schedule, None);
        assert_eq!(answers.email_title, None);
        assert!(answers.interests.is_empty());
    }

    #[test]
    fn invalid_interest_leaves_list_unchanged() {
        let (answers, _) = run("Ada\n\n\n\nbogus:foo\n\n");
        assert!(answers.interests.is_empty());
    }

    #[test]
    fn email_shape_check() {
        assert!(valid_email("a@b.co"));
        assert!(valid_email("first.last@sub.domain.org"));
        assert!(!valid_email("a.b.co"));
        assert!(!valid_email("a@b"));
        assert!(!valid_email("a@b."));
        assert!(!valid_email("@b.co"));
        assert!(!valid_email("a@@b.co"));
    }

    #[test]
    fn interest_session_add_list_remove() {
        let mut store = ConfigStore::load(
            std::env::temp_dir().join(format!("arxiv-scan-wizard-{}.json", std::process::id())),
        )
        .unwrap();
        let script = "ti:bandits\nall:quantum\nlist\nremove 0\nremove 9\n\n";
        let mut input = Cursor::new(script.to_string());
        let mut output = Vec::new();
        run_interest_session(&mut input, &mut output, &mut store).unwrap();

        let rendered = String::from_utf8(output).unwrap();
        assert!(rendered.contains("ID\tCAT\tQUERY"));
        assert!(rendered.contains("0\tti\tbandits"));
        assert!(rendered.contains("Removed ti:bandits"));
        assert!(rendered.contains("No interest with that id."));
        assert_eq!(store.config().interests.len(), 1);
        assert_eq!(store.config().interests[0].query, "quantum");
    }
}
