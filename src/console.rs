//! Line syntax of the console harness.
//!
//! ```text
//! /start expense value=150 description=Diesel for the tractor
//! /set category Fuel        change one field
//! /set category             reopen one field
//! /edit                     enter edit mode
//! /edit value=180           edit the last record
//! /confirm  /delete  /cancel
//! /plan pro [sub-plan]      switch the caller's plan
//! /quit
//! ```
//!
//! A line without a leading `/` answers the awaited field, unless it holds
//! `field=value` pairs, which continue the active registration.

use std::str::FromStr;

use registration_flows::application::FlowCommand;
use registration_flows::domain::registration::{FieldValue, FlowType, PlanContext, RawFieldUpdates};

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(FlowCommand),
    Plan(PlanContext),
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown command '/{0}'. Type /help for the list.")]
    UnknownCommand(String),

    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),

    #[error("{0}")]
    UnknownFlow(String),
}

pub fn parse_line(line: &str) -> Result<ConsoleInput, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleInput::Empty);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ConsoleInput::Command(if line.contains('=') {
            FlowCommand::Continue {
                updates: parse_pairs(line),
            }
        } else {
            FlowCommand::Answer {
                value: FieldValue::from_input(line),
            }
        }));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "start" => {
            let (flow, pairs) = match args.split_once(char::is_whitespace) {
                Some((flow, pairs)) => (flow, pairs),
                None => (args, ""),
            };
            if flow.is_empty() {
                return Err(ParseError::MissingArgument("start"));
            }
            let flow_type =
                FlowType::from_str(flow).map_err(|e| ParseError::UnknownFlow(e.to_string()))?;
            FlowCommand::Start {
                flow_type,
                updates: parse_pairs(pairs),
            }
        }
        "set" => {
            let (field, value) = match args.split_once(char::is_whitespace) {
                Some((field, value)) => (field, Some(FieldValue::from_input(value))),
                None => (args, None),
            };
            if field.is_empty() {
                return Err(ParseError::MissingArgument("set"));
            }
            FlowCommand::Change {
                field: field.to_string(),
                value,
            }
        }
        "edit" if args.is_empty() => FlowCommand::Edit,
        "edit" => FlowCommand::EditFields {
            updates: parse_pairs(args),
        },
        "confirm" => FlowCommand::Confirm,
        "delete" => FlowCommand::Delete,
        "cancel" => FlowCommand::Cancel,
        "plan" => {
            let mut parts = args.split_whitespace();
            let plan_id = parts.next().map(str::to_string);
            let sub_plan_id = parts.next().map(str::to_string);
            return Ok(ConsoleInput::Plan(PlanContext::new(plan_id, sub_plan_id)));
        }
        "help" => return Ok(ConsoleInput::Help),
        "quit" | "exit" => return Ok(ConsoleInput::Quit),
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(ConsoleInput::Command(command))
}

/// Splits `a=1 b=two words` into pairs; words without `=` extend the previous value.
fn parse_pairs(input: &str) -> RawFieldUpdates {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for word in input.split_whitespace() {
        match word.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                pairs.push((name.to_string(), value.to_string()))
            }
            _ => {
                if let Some((_, value)) = pairs.last_mut() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(word);
                }
            }
        }
    }

    let mut updates = RawFieldUpdates::new();
    for (name, value) in pairs {
        updates.push(name, FieldValue::from_input(&value));
    }
    updates
}

pub const HELP: &str = "\
/start <flow> [field=value ...]   start a registration
                                  (flows: appointment, birth, death, sale, purchase, expense)
/set <field> [value]              change or reopen a field
/edit [field=value ...]           edit the last record
/confirm | /delete | /cancel
/plan [plan] [sub-plan]           switch the caller's plan
/quit";
