// ABOUTME: Plain-text rendering of change sets, events and outputs.
// ABOUTME: Replacements render as a remove-and-add pair.

use crate::cfn::{
    ChangeAction, ChangeDetail, ChangeSource, Evaluation, Recreation, ResourceChange, StackEvent,
    StackOutput,
};
use crate::output::field;
use std::io::{self, Write};

pub fn change_set<W: Write>(w: &mut W, changes: &[ResourceChange]) -> io::Result<()> {
    for change in changes {
        writeln!(w)?;

        if change.replacement {
            change_header(w, ChangeAction::Remove, change)?;
            change_header(w, ChangeAction::Add, change)?;
        } else {
            change_header(w, change.action, change)?;
        }

        if let Some(physical_id) = &change.physical_id {
            field(w, " Resource", physical_id)?;
        }

        for detail in &change.details {
            change_detail(w, detail)?;
        }
    }

    Ok(())
}

fn change_header<W: Write>(
    w: &mut W,
    action: ChangeAction,
    change: &ResourceChange,
) -> io::Result<()> {
    let symbol = match action {
        ChangeAction::Remove => "-",
        ChangeAction::Modify => "~",
        ChangeAction::Add => "+",
        ChangeAction::Unknown => "???",
    };

    writeln!(w, "{symbol} {} {}", change.resource_type, change.logical_id)
}

pub fn change_detail<W: Write>(w: &mut W, detail: &ChangeDetail) -> io::Result<()> {
    write!(w, "   Change: ")?;

    if let Some(attribute) = &detail.attribute {
        write!(w, "{attribute}")?;
    }
    if let Some(name) = &detail.property_name {
        write!(w, ".{name}")?;
    }

    match detail.evaluation {
        Evaluation::Dynamic => write!(w, " <~")?,
        Evaluation::Static => write!(w, " <-")?,
    }

    match &detail.change_source {
        ChangeSource::ResourceReference | ChangeSource::ParameterReference => {
            write!(w, " !Ref")?;
            if let Some(entity) = &detail.causing_entity {
                write!(w, " {entity}")?;
            }
        }
        ChangeSource::ResourceAttribute => {
            write!(w, " !GetAtt")?;
            if let Some(entity) = &detail.causing_entity {
                write!(w, " {entity}")?;
            }
        }
        ChangeSource::DirectModification | ChangeSource::Automatic => {
            write!(w, " ...")?;
        }
        ChangeSource::Other(source) => {
            write!(w, " ??? unknown change source \"{source}\"")?;
        }
    }

    // Parenthesized comments accumulate: change source first, then the
    // recreation severity.
    let mut comments = 0;

    match &detail.change_source {
        ChangeSource::DirectModification => {
            write!(w, " (direct modification")?;
            comments += 1;
        }
        ChangeSource::Automatic => {
            write!(w, " (automatic")?;
            comments += 1;
        }
        _ => {}
    }

    match detail.requires_recreation {
        Recreation::Conditionally => {
            write!(w, "{}", if comments == 0 { " (" } else { ", " })?;
            write!(w, "conditional replacement")?;
            comments += 1;
        }
        Recreation::Always => {
            write!(w, "{}", if comments == 0 { " (" } else { ", " })?;
            write!(w, "always replace")?;
            comments += 1;
        }
        Recreation::Never => {}
    }

    if comments > 0 {
        write!(w, ")")?;
    }

    writeln!(w)
}

pub fn stack_event<W: Write>(w: &mut W, event: &StackEvent) -> io::Result<()> {
    writeln!(
        w,
        "Error! {} {}: {}",
        event.resource_type,
        event.logical_id,
        event.reason.as_deref().unwrap_or("???"),
    )
}

pub fn stack_output<W: Write>(w: &mut W, output: &StackOutput) -> io::Result<()> {
    field(w, &output.key, &output.value)
}
