//! Interactive prompt implementation for CLI

use dialoguer::Select;
use shuck_core::{OneEntryChoice, OneEntryPrompt};

/// Terminal prompt for the single-entry question
pub struct TermPrompt;

impl OneEntryPrompt for TermPrompt {
    fn choose(&mut self, entry: &str) -> OneEntryChoice {
        let options = vec![
            "[H]ere",
            "[W]rap in a directory",
            "[A]lways here",
            "A[l]ways wrap",
        ];

        let prompt = format!("Archive holds a single entry: {}", entry);
        let selection = Select::new()
            .with_prompt(&prompt)
            .items(&options)
            .default(0) // Default to Here
            .interact()
            .unwrap_or(0);

        match selection {
            0 => OneEntryChoice::Here,
            1 => OneEntryChoice::Wrap,
            2 => OneEntryChoice::AlwaysHere,
            3 => OneEntryChoice::AlwaysWrap,
            _ => OneEntryChoice::Here,
        }
    }
}
