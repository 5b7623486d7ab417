//! Form catalog and form tree editing commands.
//!
//! Every structural edit follows the same transaction shape: fetch the
//! tree, stage the edit on a working copy, persist the serialized groups,
//! and only report success once the backend accepted the write. A failed
//! persist drops the staged copy; nothing is retried.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use colored::*;
use dialoguer::Confirm;
use log::info;

use crate::api::{FormPatch, RopClient};
use crate::config::Config;
use crate::form::{
    reveal_candidates, EditError, Form, FormEditor, Id, Question, QuestionKind, RevealPolicy,
    RevealTarget, ENTRY_GROUP_ID,
};

#[derive(Args)]
pub struct FormCommands {
    #[command(subcommand)]
    pub command: FormSubcommands,
}

#[derive(Subcommand)]
pub enum FormSubcommands {
    /// List the organization's forms
    List {
        /// Keep only forms whose name contains this substring
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a form's group/question tree
    Show {
        /// Form id (defaults to the last opened form)
        form: Option<Id>,
    },
    /// Create a new form
    Create { name: String },
    /// Delete a form, its candidates and its interviews
    Delete {
        form: Id,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Rename a form
    Rename { form: Id, name: String },
    /// Replace a form's description
    Desc { form: Id, desc: String },
    /// Set the open window; each bound is RFC 3339 or "none"
    OpenWindow { form: Id, start: String, end: String },
    /// Question group operations
    #[command(subcommand)]
    Group(GroupCommands),
    /// Question operations
    #[command(subcommand)]
    Question(QuestionCommands),
    /// Choice option operations
    #[command(subcommand)]
    Option(OptionCommands),
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// Append a new question group
    Add { form: Id },
    /// Rename a question group
    Rename { form: Id, group: Id, label: String },
    /// Set the group revealed after this one; target is a group id or "none"
    Next {
        form: Id,
        group: Id,
        target: String,
        /// Permit reveal loops between groups
        #[arg(long)]
        allow_cycles: bool,
    },
    /// List the groups a group (or its options) may reveal
    Targets { form: Id, group: Id },
    /// Delete a question group and all its questions
    Delete {
        form: Id,
        group: Id,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum QuestionCommands {
    /// Append a new text question to a group
    Add { form: Id, group: Id },
    /// Delete the question at a zero-based position
    Delete { form: Id, group: Id, index: usize },
    /// Move the question at a zero-based position by a signed offset
    Move { form: Id, group: Id, index: usize, delta: isize },
    /// Switch a question's variant: text, choice, or choice-depart
    Kind { form: Id, group: Id, index: usize, kind: String },
    /// Replace a question's title
    Title { form: Id, group: Id, index: usize, title: String },
    /// Replace a question's description
    Desc { form: Id, group: Id, index: usize, desc: String },
    /// Mark a question optional or required
    Optional {
        form: Id,
        group: Id,
        index: usize,
        #[arg(action = clap::ArgAction::Set)]
        optional: bool,
    },
    /// Set a text question's maximum auto-growing line count
    MaxLine { form: Id, group: Id, index: usize, lines: u8 },
    /// Set a choice question's maximum selection count
    MaxSelection { form: Id, group: Id, index: usize, count: u32 },
}

#[derive(Subcommand)]
pub enum OptionCommands {
    /// Add a new option revealing nothing
    Add { form: Id, group: Id, index: usize },
    /// Rename an option, keeping its position
    Rename { form: Id, group: Id, index: usize, old: String, new: String },
    /// Delete an option
    Delete { form: Id, group: Id, index: usize, label: String },
    /// Set an option's reveal: a group id, "none", or "hide"
    Reveal {
        form: Id,
        group: Id,
        index: usize,
        label: String,
        target: String,
        /// Permit reveal loops between groups
        #[arg(long)]
        allow_cycles: bool,
    },
}

pub async fn form_command(
    client: &RopClient,
    config: &mut Config,
    args: FormCommands,
) -> Result<()> {
    match args.command {
        FormSubcommands::List { search } => list_command(client, search).await,
        FormSubcommands::Show { form } => {
            let form = form
                .or(config.last_form)
                .context("No form id given and no last-opened form on record")?;
            let detail = client.get_form(form).await?;
            config.remember_form(form)?;
            print_form(&detail);
            Ok(())
        }
        FormSubcommands::Create { name } => {
            let org = client.org_id().await?;
            let id = client.create_form(org, &name).await?;
            config.remember_form(id)?;
            println!("Created form {} ({})", id, name);
            Ok(())
        }
        FormSubcommands::Delete { form, force } => {
            if !force
                && !Confirm::new()
                    .with_prompt(format!(
                        "Delete form {} with all its candidates and interviews?",
                        form
                    ))
                    .default(false)
                    .interact()?
            {
                return Ok(());
            }
            client.delete_form(form).await?;
            println!("Deleted form {}", form);
            Ok(())
        }
        FormSubcommands::Rename { form, name } => {
            client.edit_form(form, &FormPatch::name(name.as_str())).await?;
            println!("Renamed form {} to {}", form, name);
            Ok(())
        }
        FormSubcommands::Desc { form, desc } => {
            client.edit_form(form, &FormPatch::desc(desc)).await?;
            println!("Saved description of form {}", form);
            Ok(())
        }
        FormSubcommands::OpenWindow { form, start, end } => {
            let patch = FormPatch::open_window(parse_bound(&start)?, parse_bound(&end)?);
            client.edit_form(form, &patch).await?;
            println!("Saved open window of form {}", form);
            Ok(())
        }
        FormSubcommands::Group(command) => group_command(client, command).await,
        FormSubcommands::Question(command) => question_command(client, command).await,
        FormSubcommands::Option(command) => option_command(client, command).await,
    }
}

async fn group_command(client: &RopClient, command: GroupCommands) -> Result<()> {
    match command {
        GroupCommands::Add { form } => {
            let editor = load_editor(client, form, false).await?;
            let staged = editor.add_group();
            persist_tree(client, &staged).await?;
            let added = staged.form().children.last().expect("group was just added");
            println!("Added group {} ({})", added.id, added.label);
            Ok(())
        }
        GroupCommands::Rename { form, group, label } => {
            let editor = load_editor(client, form, false).await?;
            let staged = editor.rename_group(group, label.as_str())?;
            persist_tree(client, &staged).await?;
            println!("Renamed group {} to {}", group, label);
            Ok(())
        }
        GroupCommands::Next { form, group, target, allow_cycles } => {
            let target = match target.as_str() {
                "none" => None,
                id => Some(id.parse::<Id>().context("target must be a group id or \"none\"")?),
            };
            let editor = load_editor(client, form, allow_cycles).await?;
            let staged = editor.set_group_next(group, target)?;
            persist_tree(client, &staged).await?;
            match target {
                Some(target) => println!("Group {} now reveals group {}", group, target),
                None => println!("Group {} no longer reveals another group", group),
            }
            Ok(())
        }
        GroupCommands::Targets { form, group } => {
            let editor = load_editor(client, form, false).await?;
            if !editor.form().has_group(group) {
                anyhow::bail!(EditError::GroupNotFound(group));
            }
            println!("Candidate reveal targets for group {}:", group);
            for id in reveal_candidates(editor.form(), group) {
                let label = &editor.form().group(id).expect("candidate exists").label;
                println!("  {:>4}  {}", id, label);
            }
            println!("  none  (reveal nothing)");
            Ok(())
        }
        GroupCommands::Delete { form, group, force } => {
            let editor = load_editor(client, form, false).await?;
            let question_count =
                editor.form().group(group).map(|g| g.children.len()).unwrap_or(0);
            if !force
                && !Confirm::new()
                    .with_prompt(format!(
                        "Delete group {} and its {} question(s)?",
                        group, question_count
                    ))
                    .default(false)
                    .interact()?
            {
                return Ok(());
            }
            let staged = editor.delete_group(group)?;
            persist_tree(client, &staged).await?;
            println!("Deleted group {}", group);
            Ok(())
        }
    }
}

async fn question_command(client: &RopClient, command: QuestionCommands) -> Result<()> {
    match command {
        QuestionCommands::Add { form, group } => {
            let editor = load_editor(client, form, false).await?;
            let staged = editor.add_question(group)?;
            persist_tree(client, &staged).await?;
            let added = staged
                .form()
                .group(group)
                .and_then(|g| g.children.last())
                .expect("question was just added");
            println!("Added question {} to group {}", added.id, group);
            Ok(())
        }
        QuestionCommands::Delete { form, group, index } => {
            let editor = load_editor(client, form, false).await?;
            let staged = editor.delete_question(group, index)?;
            persist_tree(client, &staged).await?;
            println!("Deleted question {} of group {}", index, group);
            Ok(())
        }
        QuestionCommands::Move { form, group, index, delta } => {
            let editor = load_editor(client, form, false).await?;
            let staged = editor.move_question(group, index, delta)?;
            persist_tree(client, &staged).await?;
            println!("Moved question {} of group {} by {}", index, group, delta);
            Ok(())
        }
        QuestionCommands::Kind { form, group, index, kind } => {
            let kind: QuestionKind = kind.parse()?;
            let departs = match kind {
                QuestionKind::ChoiceDepart => {
                    let org = client.org_id().await?;
                    client.get_org(org).await?.children
                }
                _ => vec![],
            };
            edit_question(client, form, group, index, |q| Ok(q.with_kind(kind, &departs))).await
        }
        QuestionCommands::Title { form, group, index, title } => {
            edit_question(client, form, group, index, |q| {
                let mut next = q.clone();
                next.title = title.clone();
                Ok(next)
            })
            .await
        }
        QuestionCommands::Desc { form, group, index, desc } => {
            edit_question(client, form, group, index, |q| {
                let mut next = q.clone();
                next.desc = if desc.is_empty() { None } else { Some(desc.clone()) };
                Ok(next)
            })
            .await
        }
        QuestionCommands::Optional { form, group, index, optional } => {
            edit_question(client, form, group, index, |q| {
                let mut next = q.clone();
                next.optional = optional.then_some(true);
                Ok(next)
            })
            .await
        }
        QuestionCommands::MaxLine { form, group, index, lines } => {
            edit_question(client, form, group, index, |q| Ok(q.set_max_line(lines)?)).await
        }
        QuestionCommands::MaxSelection { form, group, index, count } => {
            edit_question(client, form, group, index, |q| Ok(q.set_max_selection(count)?)).await
        }
    }
}

async fn option_command(client: &RopClient, command: OptionCommands) -> Result<()> {
    match command {
        OptionCommands::Add { form, group, index } => {
            edit_question(client, form, group, index, |q| Ok(q.add_option()?)).await
        }
        OptionCommands::Rename { form, group, index, old, new } => {
            edit_question(client, form, group, index, |q| Ok(q.rename_option(&old, &new)?)).await
        }
        OptionCommands::Delete { form, group, index, label } => {
            edit_question(client, form, group, index, |q| Ok(q.remove_option(&label)?)).await
        }
        OptionCommands::Reveal { form, group, index, label, target, allow_cycles } => {
            let target = match target.as_str() {
                "none" => RevealTarget::None,
                "hide" => RevealTarget::Hidden,
                id => RevealTarget::Group(
                    id.parse::<Id>().context("target must be a group id, \"none\" or \"hide\"")?,
                ),
            };
            let editor = load_editor(client, form, allow_cycles).await?;
            let question = current_question(&editor, group, index)?;
            let staged = editor.replace_question(
                group,
                index,
                question.set_option_reveal(&label, target)?,
            )?;
            persist_tree(client, &staged).await?;
            println!("Saved option {} of question {} in group {}", label, index, group);
            Ok(())
        }
    }
}

async fn list_command(client: &RopClient, search: Option<String>) -> Result<()> {
    let org = client.org_id().await?;
    let mut forms = client.list_forms(org).await?;
    if let Some(search) = &search {
        forms.retain(|f| f.name.contains(search.as_str()));
    }
    println!("Forms ({})", forms.len());
    for form in &forms {
        println!(
            "  {:>4}  {}  {} ~ {}",
            form.id,
            form.name.bold(),
            fmt_bound(form.start_at),
            fmt_bound(form.end_at),
        );
    }
    Ok(())
}

/// Fetch a form and wrap it in an editor with the requested cycle policy.
async fn load_editor(client: &RopClient, form: Id, allow_cycles: bool) -> Result<FormEditor> {
    let form = client.get_form(form).await?;
    let policy =
        if allow_cycles { RevealPolicy::AllowCycles } else { RevealPolicy::RejectCycles };
    Ok(FormEditor::new(form, policy))
}

/// Persist the staged tree. The caller's previous editor stays valid; a
/// failure here leaves local state at the pre-edit snapshot.
async fn persist_tree(client: &RopClient, staged: &FormEditor) -> Result<()> {
    let form = staged.form();
    client.edit_form(form.id, &FormPatch::children(&form.children)?).await?;
    info!("Persisted {} group(s) of form {}", form.children.len(), form.id);
    Ok(())
}

fn current_question(editor: &FormEditor, group: Id, index: usize) -> Result<Question, EditError> {
    editor
        .form()
        .group(group)
        .ok_or(EditError::GroupNotFound(group))?
        .children
        .get(index)
        .cloned()
        .ok_or(EditError::QuestionIndexOutOfBounds { group, index })
}

/// Fetch, stage one question edit, persist.
async fn edit_question(
    client: &RopClient,
    form: Id,
    group: Id,
    index: usize,
    edit: impl FnOnce(&Question) -> Result<Question>,
) -> Result<()> {
    let editor = load_editor(client, form, false).await?;
    let question = current_question(&editor, group, index)?;
    let staged = editor.replace_question(group, index, edit(&question)?)?;
    persist_tree(client, &staged).await?;
    println!("Saved question {} of group {}", index, group);
    Ok(())
}

fn parse_bound(value: &str) -> Result<Option<DateTime<Utc>>> {
    if value == "none" {
        return Ok(None);
    }
    let parsed = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid time (want RFC 3339 or \"none\"): {}", value))?;
    Ok(Some(parsed.with_timezone(&Utc)))
}

fn fmt_bound(bound: Option<DateTime<Utc>>) -> String {
    match bound {
        Some(t) => t.format("%Y.%m.%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

fn print_form(form: &Form) {
    println!("{} {}", format!("#{}", form.id).dimmed(), form.name.bold());
    if !form.desc.is_empty() {
        println!("{}", form.desc);
    }
    println!("Open: {} ~ {}", fmt_bound(form.start_at), fmt_bound(form.end_at));
    for group in &form.children {
        let entry = if group.id == ENTRY_GROUP_ID { " (entry)".bright_blue().to_string() } else { String::new() };
        let next = match group.next {
            Some(next) => format!("  -> group {}", next).dimmed().to_string(),
            None => String::new(),
        };
        println!("\nGroup {}: {}{}{}", group.id, group.label.bold(), entry, next);
        for (index, question) in group.children.iter().enumerate() {
            let required = if question.required() { "*" } else { " " };
            println!(
                "  [{}]{} #{} {} ({})",
                index,
                required,
                question.id,
                question.title,
                kind_tag(question)
            );
            if let Some(choices) = question.choices() {
                for (label, reveal) in choices {
                    match reveal {
                        Some(target) => println!("        - {} -> group {}", label, target),
                        None => println!("        - {}", label),
                    }
                }
            }
        }
    }
}

fn kind_tag(question: &Question) -> &'static str {
    match question.kind() {
        QuestionKind::Text => "text",
        QuestionKind::Choice => "choice",
        QuestionKind::ChoiceDepart => "choice-depart",
    }
}
