use crate::ast::{BuiltinType, ParsedModule, Revision};
use crate::error::ValidationError;
use crate::parser::{ParserContext, PendingScope};
use std::collections::HashMap;

/// Checks a date argument: `4DIGIT "-" 2DIGIT "-" 2DIGIT`, naming a real calendar day.
///
/// `statement` is the keyword the date belongs to, used in the error message.
pub fn check_date(date: &str, statement: &str, line: usize) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        date: date.to_string(),
        statement: statement.to_string(),
        line,
    };

    let bytes = date.as_bytes();
    if bytes.len() != 10 {
        return Err(invalid());
    }
    for (i, b) in bytes.iter().enumerate() {
        let ok = match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        };
        if !ok {
            return Err(invalid());
        }
    }

    // All ten bytes are ASCII at this point, so slicing is safe.
    let year: u32 = date[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = date[5..7].parse().map_err(|_| invalid())?;
    let day: u32 = date[8..10].parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return Err(invalid());
    }
    Ok(())
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Moves the newest revision to the front. The rest of the list keeps its order.
pub fn sort_revisions(revisions: &mut [Revision]) {
    let mut newest = 0;
    for (i, rev) in revisions.iter().enumerate().skip(1) {
        if rev.date > revisions[newest].date {
            newest = i;
        }
    }
    if newest != 0 {
        revisions.swap(0, newest);
    }
}

/// Checks `prefix` against the module's own prefix and every import prefix.
///
/// `own_slot` is the index of the import that carries `prefix` when it is already
/// in `module.imports`, so the import is not reported as colliding with itself.
pub fn check_prefix(
    module: &ParsedModule,
    prefix: &str,
    own_slot: Option<usize>,
    line: usize,
) -> Result<(), ValidationError> {
    let taken = module.prefix == prefix
        || module
            .imports
            .iter()
            .enumerate()
            .any(|(i, imp)| Some(i) != own_slot && imp.prefix == prefix);
    if taken {
        return Err(ValidationError::DuplicatePrefix {
            prefix: prefix.to_string(),
            module: module.name.clone(),
            line,
        });
    }
    Ok(())
}

/// Reports every typedef name that appears twice in one scope, or that reuses a built-in
/// type name. The module top level spans the module and all its submodules; node scopes
/// come from the pending set in `pctx`, which is consumed.
pub fn check_typedefs(pctx: &mut ParserContext) -> Result<(), ValidationError> {
    let scopes = std::mem::take(&mut pctx.tpdfs_nodes);
    let module = &pctx.module;
    let mut collisions = Vec::new();

    let top_level: Vec<(String, usize)> = std::iter::once(module)
        .chain(module.submodules())
        .flat_map(|m| m.typedefs.iter().map(|t| (t.name.clone(), t.line)))
        .collect();
    let module_scope = format!("module \"{}\"", module.name);

    for (owner, names) in std::iter::once((module_scope.as_str(), top_level.as_slice()))
        .chain(scopes.iter().map(|s| (s.owner.as_str(), s.names.as_slice())))
    {
        for (name, line) in names {
            if BuiltinType::from_name(name).is_some() {
                collisions.push(ValidationError::BuiltinTypeName {
                    name: name.clone(),
                    line: *line,
                });
            }
        }
        for (name, line) in duplicates(names) {
            collisions.push(ValidationError::DuplicateTypedef {
                name,
                scope: owner.to_string(),
                line,
            });
        }
    }

    if collisions.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::TypedefCollisions {
            module: module.name.clone(),
            collisions,
        })
    }
}

/// The grouping counterpart of [`check_typedefs`].
pub fn check_groupings(pctx: &mut ParserContext) -> Result<(), ValidationError> {
    let scopes = std::mem::take(&mut pctx.grps_nodes);
    let module = &pctx.module;
    let mut collisions = Vec::new();

    let top_level: Vec<(String, usize)> = std::iter::once(module)
        .chain(module.submodules())
        .flat_map(|m| m.groupings.iter().map(|g| (g.name.clone(), g.line)))
        .collect();
    let top = PendingScope {
        owner: format!("module \"{}\"", module.name),
        line: module.line,
        names: top_level,
    };

    for scope in std::iter::once(&top).chain(scopes.iter()) {
        for (name, line) in duplicates(&scope.names) {
            collisions.push(ValidationError::DuplicateGrouping {
                name,
                scope: scope.owner.clone(),
                line,
            });
        }
    }

    if collisions.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::GroupingCollisions {
            module: module.name.clone(),
            collisions,
        })
    }
}

/// Every repeated name after its first occurrence.
fn duplicates(names: &[(String, usize)]) -> Vec<(String, usize)> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut out = Vec::new();
    for (name, line) in names {
        if seen.insert(name.as_str(), *line).is_some() {
            out.push((name.clone(), *line));
        }
    }
    out
}
