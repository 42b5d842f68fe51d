//! `deviation` statements: a module declaring that its implementation of a node
//! differs from the schema, either by not supporting the node at all or by adding,
//! replacing and deleting properties of it.
//!
//! All `deviate` statements aimed at one node are folded over a [`Properties`]
//! snapshot of that node. The compiler decides where the result is written.

use crate::ast::{Deviate, DeviateKind};
use crate::error::ResolverError;
use crate::schema::{CompiledNode, CompiledNodeKind, CompiledType};
use log::debug;

/// What the deviations of one target do to it.
#[derive(Debug, Clone)]
pub enum DeviationEffect {
    /// `deviate not-supported`: the node and its subtree go away.
    Remove,
    /// The node's properties once every `deviate` has been applied.
    Patch(Box<Properties>),
}

/// The properties of a node a `deviate` can touch.
#[derive(Debug, Clone)]
pub struct Properties {
    pub config: bool,
    pub config_set: bool,
    pub mandatory: bool,
    pub mandatory_set: bool,
    pub units: Option<String>,
    /// A single value for leaves and choices.
    pub defaults: Vec<String>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    pub musts: Vec<String>,
    pub uniques: Vec<String>,
    pub type_: Option<CompiledType>,
}

impl Properties {
    #[must_use]
    pub fn of(node: &CompiledNode) -> Self {
        let mut props = Properties {
            config: node.config,
            config_set: node.config_set,
            mandatory: node.mandatory,
            mandatory_set: node.mandatory_set,
            units: None,
            defaults: Vec::new(),
            min_elements: None,
            max_elements: None,
            musts: node.musts.clone(),
            uniques: Vec::new(),
            type_: None,
        };
        match &node.kind {
            CompiledNodeKind::Leaf { type_, units, default } => {
                props.type_ = Some(type_.clone());
                props.units.clone_from(units);
                props.defaults = default.iter().cloned().collect();
            }
            CompiledNodeKind::LeafList {
                type_,
                units,
                defaults,
                min_elements,
                max_elements,
                ..
            } => {
                props.type_ = Some(type_.clone());
                props.units.clone_from(units);
                props.defaults.clone_from(defaults);
                props.min_elements = *min_elements;
                props.max_elements = *max_elements;
            }
            CompiledNodeKind::List {
                uniques,
                min_elements,
                max_elements,
                ..
            } => {
                props.uniques.clone_from(uniques);
                props.min_elements = *min_elements;
                props.max_elements = *max_elements;
            }
            CompiledNodeKind::Choice { default, .. } => {
                props.defaults = default.iter().cloned().collect();
            }
            _ => {}
        }
        props
    }

    /// Writes the snapshot back. A changed `config` is pushed down to the descendants
    /// that inherit it.
    pub fn write(self, node: &mut CompiledNode) {
        if self.config != node.config {
            if self.config {
                node.enable_config();
            } else {
                node.clear_config();
            }
        }
        node.config_set = self.config_set;
        node.mandatory = self.mandatory;
        node.mandatory_set = self.mandatory_set;
        node.musts = self.musts;
        match &mut node.kind {
            CompiledNodeKind::Leaf { type_, units, default } => {
                if let Some(replaced) = self.type_ {
                    *type_ = replaced;
                }
                *units = self.units;
                *default = self.defaults.into_iter().next();
            }
            CompiledNodeKind::LeafList {
                type_,
                units,
                defaults,
                min_elements,
                max_elements,
                ..
            } => {
                if let Some(replaced) = self.type_ {
                    *type_ = replaced;
                }
                *units = self.units;
                *defaults = self.defaults;
                *min_elements = self.min_elements;
                *max_elements = self.max_elements;
            }
            CompiledNodeKind::List {
                uniques,
                min_elements,
                max_elements,
                ..
            } => {
                *uniques = self.uniques;
                *min_elements = self.min_elements;
                *max_elements = self.max_elements;
            }
            CompiledNodeKind::Choice { default, .. } => {
                *default = self.defaults.into_iter().next();
            }
            _ => {}
        }
    }
}

/// One `deviate` together with the type it replaces, already resolved.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub deviate: &'a Deviate,
    pub type_: Option<&'a CompiledType>,
}

/// Folds every `deviate` aimed at `node` into one effect.
pub fn effect(node: &CompiledNode, target: &str, steps: &[Step<'_>]) -> Result<DeviationEffect, ResolverError> {
    if let Some(step) = steps
        .iter()
        .find(|s| s.deviate.kind == DeviateKind::NotSupported)
    {
        if steps.len() > 1 {
            return Err(ResolverError::InvalidDeviation {
                target: target.to_string(),
                reason: "\"not-supported\" cannot be combined with other deviates of the same node"
                    .to_string(),
                line: step.deviate.line,
            });
        }
        debug!("Deviation removes \"{target}\"");
        return Ok(DeviationEffect::Remove);
    }

    let mut props = Properties::of(node);
    for step in steps {
        apply(&mut props, &node.kind, *step, target)?;
    }
    if let Some(last) = steps.last() {
        check(&props, &node.kind, target, last.deviate.line)?;
    }
    debug!("Deviation patches \"{target}\" with {} deviate(s)", steps.len());
    Ok(DeviationEffect::Patch(Box::new(props)))
}

/// The properties a `deviate` carries, by keyword.
fn carried(deviate: &Deviate) -> Vec<&'static str> {
    let flags = [
        ("type", deviate.type_ref.is_some()),
        ("units", deviate.units.is_some()),
        ("default", !deviate.defaults.is_empty()),
        ("config", deviate.config.is_some()),
        ("mandatory", deviate.mandatory.is_some()),
        ("min-elements", deviate.min_elements.is_some()),
        ("max-elements", deviate.max_elements.is_some()),
        ("must", !deviate.musts.is_empty()),
        ("unique", !deviate.uniques.is_empty()),
    ];
    flags
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
}

fn takes(kind: &CompiledNodeKind, property: &str) -> bool {
    use CompiledNodeKind as K;
    match property {
        "type" | "units" => matches!(kind, K::Leaf { .. } | K::LeafList { .. }),
        "default" => matches!(kind, K::Leaf { .. } | K::LeafList { .. } | K::Choice { .. }),
        "config" => matches!(
            kind,
            K::Container { .. }
                | K::Leaf { .. }
                | K::LeafList { .. }
                | K::List { .. }
                | K::Choice { .. }
                | K::AnyData { .. }
        ),
        "mandatory" => matches!(kind, K::Leaf { .. } | K::Choice { .. } | K::AnyData { .. }),
        "min-elements" | "max-elements" => matches!(kind, K::LeafList { .. } | K::List { .. }),
        "must" => matches!(
            kind,
            K::Container { .. }
                | K::Leaf { .. }
                | K::LeafList { .. }
                | K::List { .. }
                | K::AnyData { .. }
                | K::Input { .. }
                | K::Output { .. }
                | K::Notification { .. }
        ),
        "unique" => matches!(kind, K::List { .. }),
        _ => false,
    }
}

fn apply(
    props: &mut Properties,
    kind: &CompiledNodeKind,
    step: Step<'_>,
    target: &str,
) -> Result<(), ResolverError> {
    let deviate = step.deviate;
    let invalid = |reason: String| ResolverError::InvalidDeviation {
        target: target.to_string(),
        reason,
        line: deviate.line,
    };
    for property in carried(deviate) {
        if !takes(kind, property) {
            return Err(invalid(format!(
                "a {} has no \"{property}\" property",
                kind.keyword()
            )));
        }
    }
    let exists = |property: &str| invalid(format!("\"{property}\" already exists and cannot be added"));
    let absent = |property: &str| invalid(format!("\"{property}\" is not present"));
    let single_default = !matches!(kind, CompiledNodeKind::LeafList { .. });

    match deviate.kind {
        DeviateKind::NotSupported => {}
        DeviateKind::Add => {
            if let Some(units) = &deviate.units {
                if props.units.is_some() {
                    return Err(exists("units"));
                }
                props.units = Some(units.clone());
            }
            if !deviate.defaults.is_empty() {
                if single_default && (!props.defaults.is_empty() || deviate.defaults.len() > 1) {
                    return Err(exists("default"));
                }
                props.defaults.extend(deviate.defaults.iter().cloned());
            }
            if let Some(config) = deviate.config {
                if props.config_set {
                    return Err(exists("config"));
                }
                props.config = config;
                props.config_set = true;
            }
            if let Some(mandatory) = deviate.mandatory {
                if props.mandatory_set {
                    return Err(exists("mandatory"));
                }
                props.mandatory = mandatory;
                props.mandatory_set = true;
            }
            if let Some(min) = deviate.min_elements {
                if props.min_elements.is_some() {
                    return Err(exists("min-elements"));
                }
                props.min_elements = Some(min);
            }
            if let Some(max) = deviate.max_elements {
                if props.max_elements.is_some() {
                    return Err(exists("max-elements"));
                }
                props.max_elements = max;
            }
            props.musts.extend(deviate.musts.iter().cloned());
            props.uniques.extend(deviate.uniques.iter().cloned());
        }
        DeviateKind::Replace => {
            if let Some(type_) = step.type_ {
                props.type_ = Some(type_.clone());
            }
            if let Some(units) = &deviate.units {
                if props.units.is_none() {
                    return Err(absent("units"));
                }
                props.units = Some(units.clone());
            }
            if !deviate.defaults.is_empty() {
                if props.defaults.is_empty() {
                    return Err(absent("default"));
                }
                if single_default && deviate.defaults.len() > 1 {
                    return Err(invalid(format!("a {} takes a single default", kind.keyword())));
                }
                props.defaults.clone_from(&deviate.defaults);
            }
            if let Some(config) = deviate.config {
                if !props.config_set {
                    return Err(absent("config"));
                }
                props.config = config;
            }
            if let Some(mandatory) = deviate.mandatory {
                if !props.mandatory_set {
                    return Err(absent("mandatory"));
                }
                props.mandatory = mandatory;
            }
            if let Some(min) = deviate.min_elements {
                if props.min_elements.is_none() {
                    return Err(absent("min-elements"));
                }
                props.min_elements = Some(min);
            }
            if let Some(max) = deviate.max_elements {
                if props.max_elements.is_none() {
                    return Err(absent("max-elements"));
                }
                props.max_elements = max;
            }
        }
        DeviateKind::Delete => {
            if let Some(units) = &deviate.units {
                if props.units.as_ref() != Some(units) {
                    return Err(invalid(format!("\"units\" value \"{units}\" is not present")));
                }
                props.units = None;
            }
            remove_values(&mut props.defaults, &deviate.defaults, "default").map_err(&invalid)?;
            remove_values(&mut props.musts, &deviate.musts, "must").map_err(&invalid)?;
            remove_values(&mut props.uniques, &deviate.uniques, "unique").map_err(&invalid)?;
        }
    }
    Ok(())
}

fn remove_values(values: &mut Vec<String>, deleted: &[String], property: &str) -> Result<(), String> {
    for value in deleted {
        let pos = values
            .iter()
            .position(|v| v == value)
            .ok_or_else(|| format!("\"{property}\" value \"{value}\" is not present"))?;
        values.remove(pos);
    }
    Ok(())
}

/// Combinations the deviated node may not end up with.
fn check(props: &Properties, kind: &CompiledNodeKind, target: &str, line: usize) -> Result<(), ResolverError> {
    let invalid = |reason: &str| ResolverError::InvalidDeviation {
        target: target.to_string(),
        reason: reason.to_string(),
        line,
    };
    let defaulted = matches!(kind, CompiledNodeKind::Leaf { .. } | CompiledNodeKind::Choice { .. });
    if defaulted && props.mandatory && !props.defaults.is_empty() {
        return Err(invalid("a mandatory node cannot have a default"));
    }
    if let (Some(min), Some(max)) = (props.min_elements, props.max_elements) {
        if min > max {
            return Err(invalid("min-elements is greater than max-elements"));
        }
    }
    Ok(())
}
