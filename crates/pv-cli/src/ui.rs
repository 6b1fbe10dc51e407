//! A plain-text conversation front end, fed from stdin or a script.

use std::io::Write;
use std::iter::Peekable;

use colored::Colorize;
use pv_dialogue::{Choice, DialogueUi, LineColor, OptionLine, SpecialTalk};

/// Choices asked for after the input ran out before giving up.
const STALL_LIMIT: usize = 16;

/// Exit code when the input runs out and the conversation will not end.
const STALLED_EXIT: i32 = 2;

pub struct TextUi {
    input: Peekable<Box<dyn Iterator<Item = String>>>,
    /// Echo each consumed token, for scripted play.
    echo: bool,
    stalled: usize,
}

impl TextUi {
    /// Read choices from a fixed list.
    pub fn scripted(choices: Vec<String>) -> Self {
        Self::new(Box::new(choices.into_iter()), true)
    }

    /// Read choices line by line from stdin.
    pub fn stdin() -> Self {
        let lines = std::io::stdin().lines().map_while(Result::ok);
        Self::new(Box::new(lines), false)
    }

    fn new(input: Box<dyn Iterator<Item = String>>, echo: bool) -> Self {
        Self {
            input: input.peekable(),
            echo,
            stalled: 0,
        }
    }

    fn prompt(&self, text: &str) {
        print!("{text}");
        std::io::stdout().flush().ok();
    }

    fn next_token(&mut self) -> Option<String> {
        let token = self.input.next()?;
        if self.echo {
            println!("{token}");
        }
        Some(token)
    }
}

impl DialogueUi for TextUi {
    fn show_line(&mut self, speaker: &str, text: &str) {
        if speaker.is_empty() {
            println!("{text}");
        } else {
            println!("{}: {text}", speaker.bold());
        }
    }

    fn show_response(&mut self, text: &str) {
        println!("{} {text}", ">".dimmed());
    }

    fn choose(&mut self, options: &[OptionLine]) -> Choice {
        for (i, option) in options.iter().enumerate() {
            println!("  {}) {}", i + 1, paint(option));
        }
        loop {
            self.prompt("> ");
            let Some(token) = self.next_token() else {
                self.stalled += 1;
                if self.stalled > STALL_LIMIT {
                    eprintln!("error: ran out of choices before the conversation ended");
                    std::process::exit(STALLED_EXIT);
                }
                return Choice::Quit;
            };
            match parse_choice(&token, options.len()) {
                Some(choice) => return choice,
                None => println!(
                    "  Pick 1-{}, q to leave, or LOOK_AT, SIZE_UP_STATS, CHECK_OPINION, YELL.",
                    options.len()
                ),
            }
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompt(&format!("{prompt} (y/n) "));
        if self.echo {
            let answer = self.input.peek().map(|t| t.trim().to_ascii_lowercase());
            match answer.as_deref() {
                Some(answer @ ("y" | "yes" | "n" | "no")) => {
                    let yes = answer.starts_with('y');
                    self.next_token();
                    yes
                }
                _ => {
                    println!("y");
                    true
                }
            }
        } else {
            self.next_token()
                .is_some_and(|t| t.trim().to_ascii_lowercase().starts_with('y'))
        }
    }

    fn notice(&mut self, text: &str) {
        println!("{}", text.italic());
    }
}

/// Parse one token: a 1-based option number, `q`, or a special key.
pub fn parse_choice(token: &str, options: usize) -> Option<Choice> {
    let token = token.trim();
    if token.eq_ignore_ascii_case("q") || token.eq_ignore_ascii_case("quit") {
        return Some(Choice::Quit);
    }
    if let Some(special) = SpecialTalk::from_key(&token.to_ascii_uppercase()) {
        return Some(Choice::Special(special));
    }
    match token.parse::<usize>() {
        Ok(n) if (1..=options).contains(&n) => Some(Choice::Index(n - 1)),
        _ => None,
    }
}

fn paint(option: &OptionLine) -> colored::ColoredString {
    let text = option.text.as_str();
    match option.color {
        LineColor::White => text.normal(),
        LineColor::Red => text.red(),
        LineColor::LightRed => text.bright_red(),
        LineColor::Green => text.green(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_one_based() {
        assert_eq!(parse_choice("1", 3), Some(Choice::Index(0)));
        assert_eq!(parse_choice(" 3 ", 3), Some(Choice::Index(2)));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
    }

    #[test]
    fn quit_and_special_keys() {
        assert_eq!(parse_choice("q", 2), Some(Choice::Quit));
        assert_eq!(parse_choice("QUIT", 2), Some(Choice::Quit));
        assert_eq!(parse_choice("look_at", 2), Some(Choice::Special(SpecialTalk::LookAt)));
        assert_eq!(parse_choice("YELL", 2), Some(Choice::Special(SpecialTalk::Yell)));
        assert_eq!(parse_choice("dance", 2), None);
    }

    #[test]
    fn scripted_confirmations_default_to_yes() {
        let mut ui = TextUi::scripted(vec!["n".into(), "2".into()]);
        assert!(!ui.confirm("Proceed?"));
        assert!(ui.confirm("Proceed?"));
        assert_eq!(ui.next_token().as_deref(), Some("2"));
    }
}
