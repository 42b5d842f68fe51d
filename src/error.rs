use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Coarse classification of every failure the crate can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed source text.
    Syntax,
    /// Duplicate names, malformed dates and similar rule violations.
    Semantic,
    /// A prefix, type, grouping or target that could not be resolved.
    Resolution,
    /// Implement conflicts, cycles and custom-check rejections.
    Policy,
    /// A requested module or submodule could not be located.
    NotFound,
    /// Reading the source failed.
    Io,
}

#[derive(Error, Debug, Diagnostic)]
pub enum YangError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),
}

impl YangError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            YangError::Parser(_) => ErrorKind::Syntax,
            YangError::Validation(_) => ErrorKind::Semantic,
            YangError::Resolver(_) => ErrorKind::Resolution,
            YangError::Load(err) => err.kind(),
        }
    }

    /// The 1-based source line the failure points at, when one is known.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            YangError::Parser(err) => err.line(),
            YangError::Validation(err) => err.line(),
            YangError::Resolver(err) => err.line(),
            YangError::Load(_) => None,
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum ParserError {
    #[error("Unexpected token on line {line}")]
    #[diagnostic(
        code(parser::unexpected_token),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}, but found this")]
        span: SourceSpan,
        expected: String,
        line: usize,
    },

    #[error("Unexpected end of input")]
    #[diagnostic(
        code(parser::unexpected_eof),
        help("The source ended before the statement was closed.")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,
        #[label("Input ended here")]
        span: SourceSpan,
        line: usize,
    },

    #[error("Unterminated string or comment on line {line}")]
    #[diagnostic(
        code(parser::unterminated),
        help("Every quoted string and block comment needs its closing delimiter.")
    )]
    Unterminated {
        #[source_code]
        src: NamedSource<String>,
        #[label("Starts here")]
        span: SourceSpan,
        line: usize,
    },

    #[error("Invalid keyword \"{keyword}\" on line {line}")]
    #[diagnostic(
        code(parser::invalid_keyword),
        help("Keywords are identifiers, optionally qualified by an extension prefix.")
    )]
    InvalidKeyword {
        #[source_code]
        src: NamedSource<String>,
        #[label("Not a valid keyword")]
        span: SourceSpan,
        keyword: String,
        line: usize,
    },

    #[error("Unexpected statement \"{keyword}\" in \"{parent}\" on line {line}")]
    #[diagnostic(
        code(parser::unexpected_statement),
        help("This statement is not allowed as a substatement of its parent.")
    )]
    UnexpectedStatement {
        #[source_code]
        src: NamedSource<String>,
        #[label("Not allowed here")]
        span: SourceSpan,
        keyword: String,
        parent: String,
        line: usize,
    },

    #[error("Missing mandatory \"{keyword}\" substatement of \"{parent}\" on line {line}")]
    #[diagnostic(code(parser::missing_statement))]
    MissingStatement {
        #[source_code]
        src: NamedSource<String>,
        #[label("Declared here")]
        span: SourceSpan,
        keyword: String,
        parent: String,
        line: usize,
    },

    #[error("Duplicate \"{keyword}\" substatement on line {line}")]
    #[diagnostic(
        code(parser::duplicate_statement),
        help("This substatement may appear at most once in its parent.")
    )]
    DuplicateStatement {
        #[source_code]
        src: NamedSource<String>,
        #[label("Second occurrence")]
        span: SourceSpan,
        keyword: String,
        line: usize,
    },

    #[error("Invalid argument of \"{keyword}\" on line {line}: {reason}")]
    #[diagnostic(code(parser::invalid_argument))]
    InvalidArgument {
        #[source_code]
        src: NamedSource<String>,
        #[label("{reason}")]
        span: SourceSpan,
        keyword: String,
        reason: String,
        line: usize,
    },

    #[error("Malformed XML on line {line}: {message}")]
    #[diagnostic(code(parser::xml))]
    Xml { message: String, line: usize },
}

impl ParserError {
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            ParserError::UnexpectedToken { line, .. }
            | ParserError::UnexpectedEof { line, .. }
            | ParserError::Unterminated { line, .. }
            | ParserError::InvalidKeyword { line, .. }
            | ParserError::UnexpectedStatement { line, .. }
            | ParserError::MissingStatement { line, .. }
            | ParserError::DuplicateStatement { line, .. }
            | ParserError::InvalidArgument { line, .. }
            | ParserError::Xml { line, .. } => Some(*line),
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum ValidationError {
    #[error("Invalid value \"{date}\" of \"{statement}\" on line {line}")]
    #[diagnostic(
        code(validation::invalid_date),
        help("Dates are written as YYYY-MM-DD and must name a real calendar day.")
    )]
    InvalidDate {
        date: String,
        statement: String,
        line: usize,
    },

    #[error("Prefix \"{prefix}\" already used in module \"{module}\" (line {line})")]
    #[diagnostic(
        code(validation::duplicate_prefix),
        help("Every import of a module needs its own prefix, distinct from the module's own prefix.")
    )]
    DuplicatePrefix {
        prefix: String,
        module: String,
        line: usize,
    },

    #[error("Duplicate typedef \"{name}\" in {scope} (line {line})")]
    #[diagnostic(code(validation::duplicate_typedef))]
    DuplicateTypedef {
        name: String,
        scope: String,
        line: usize,
    },

    #[error("Typedef \"{name}\" collides with a built-in type (line {line})")]
    #[diagnostic(code(validation::builtin_type_name))]
    BuiltinTypeName { name: String, line: usize },

    #[error("Duplicate grouping \"{name}\" in {scope} (line {line})")]
    #[diagnostic(code(validation::duplicate_grouping))]
    DuplicateGrouping {
        name: String,
        scope: String,
        line: usize,
    },

    #[error("{} typedef name collision(s) in module \"{module}\"", .collisions.len())]
    #[diagnostic(
        code(validation::typedef_collisions),
        help("Typedef names must be unique within their scope.")
    )]
    TypedefCollisions {
        module: String,
        #[related]
        collisions: Vec<ValidationError>,
    },

    #[error("{} grouping name collision(s) in module \"{module}\"", .collisions.len())]
    #[diagnostic(code(validation::grouping_collisions))]
    GroupingCollisions {
        module: String,
        #[related]
        collisions: Vec<ValidationError>,
    },
}

impl ValidationError {
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            ValidationError::InvalidDate { line, .. }
            | ValidationError::DuplicatePrefix { line, .. }
            | ValidationError::DuplicateTypedef { line, .. }
            | ValidationError::BuiltinTypeName { line, .. }
            | ValidationError::DuplicateGrouping { line, .. } => Some(*line),
            ValidationError::TypedefCollisions { collisions, .. }
            | ValidationError::GroupingCollisions { collisions, .. } => {
                collisions.first().and_then(ValidationError::line)
            }
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum ResolverError {
    #[error("Prefix \"{prefix}\" is not defined in module \"{module}\" (line {line})")]
    #[diagnostic(
        code(resolver::unknown_prefix),
        help("Import the module that should be referenced with this prefix.")
    )]
    UnknownPrefix {
        prefix: String,
        module: String,
        line: usize,
    },

    #[error("Referenced type \"{name}\" not found (module \"{module}\", line {line})")]
    #[diagnostic(code(resolver::type_not_found))]
    TypeNotFound {
        name: String,
        module: String,
        line: usize,
    },

    #[error("Grouping \"{name}\" referenced by uses not found (module \"{module}\", line {line})")]
    #[diagnostic(code(resolver::grouping_not_found))]
    GroupingNotFound {
        name: String,
        module: String,
        line: usize,
    },

    #[error("Circular chain of {what} detected at \"{name}\" (line {line})")]
    #[diagnostic(code(resolver::circular_reference))]
    CircularReference {
        what: &'static str,
        name: String,
        line: usize,
    },

    #[error("Type \"{name}\" derived from {base} is missing its \"{restriction}\" substatement (line {line})")]
    #[diagnostic(code(resolver::missing_restriction))]
    MissingRestriction {
        name: String,
        base: String,
        restriction: &'static str,
        line: usize,
    },

    #[error("Target node \"{target}\" not found (line {line})")]
    #[diagnostic(code(resolver::target_not_found))]
    TargetNotFound { target: String, line: usize },

    #[error("Target \"{target}\" belongs to module \"{module}\" which is not implemented (line {line})")]
    #[diagnostic(code(resolver::target_not_implemented))]
    TargetNotImplemented {
        target: String,
        module: String,
        line: usize,
    },

    #[error("Augment of \"{target}\" cannot hold {kind} \"{node}\" (line {line})")]
    #[diagnostic(
        code(resolver::augment_slot_mismatch),
        help("Actions and notifications need a container or list; data nodes need a node with children.")
    )]
    AugmentSlotMismatch {
        target: String,
        kind: &'static str,
        node: String,
        line: usize,
    },

    #[error("Invalid deviation of \"{target}\": {reason} (line {line})")]
    #[diagnostic(code(resolver::invalid_deviation))]
    InvalidDeviation {
        target: String,
        reason: String,
        line: usize,
    },

    #[error("Module \"{module}\" is loaded without its parsed form")]
    #[diagnostic(code(resolver::parsed_form_missing))]
    ParsedFormMissing { module: String },

    #[error("No compiled node at \"{path}\" in module \"{module}\"")]
    #[diagnostic(
        code(resolver::path_not_found),
        help("Paths name schema nodes separated by '/'; the module must be implemented.")
    )]
    PathNotFound { path: String, module: String },
}

impl ResolverError {
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            ResolverError::UnknownPrefix { line, .. }
            | ResolverError::TypeNotFound { line, .. }
            | ResolverError::GroupingNotFound { line, .. }
            | ResolverError::CircularReference { line, .. }
            | ResolverError::MissingRestriction { line, .. }
            | ResolverError::TargetNotFound { line, .. }
            | ResolverError::TargetNotImplemented { line, .. }
            | ResolverError::AugmentSlotMismatch { line, .. }
            | ResolverError::InvalidDeviation { line, .. } => Some(*line),
            ResolverError::ParsedFormMissing { .. } | ResolverError::PathNotFound { .. } => None,
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum LoadError {
    #[error("Module \"{name}\"{} not found", revision_suffix(.revision))]
    #[diagnostic(
        code(loader::module_not_found),
        help("Add the directory containing the module to the search path.")
    )]
    ModuleNotFound {
        name: String,
        revision: Option<String>,
    },

    #[error("Submodule \"{name}\"{} not found", revision_suffix(.revision))]
    #[diagnostic(code(loader::submodule_not_found))]
    SubmoduleNotFound {
        name: String,
        revision: Option<String>,
    },

    #[error("Module \"{name}\"{} is already present in the context", revision_suffix(.revision))]
    #[diagnostic(code(loader::already_present))]
    AlreadyPresent {
        name: String,
        revision: Option<String>,
    },

    #[error("Module \"{name}\" is already implemented in revision {}", .implemented.as_deref().unwrap_or("<none>"))]
    #[diagnostic(
        code(loader::already_implemented),
        help("Only one revision of a module may be implemented in a context.")
    )]
    AlreadyImplemented {
        name: String,
        implemented: Option<String>,
        requested: Option<String>,
    },

    #[error("Circular include detected: {cycle}")]
    #[diagnostic(code(loader::circular_include))]
    CircularInclude { cycle: String },

    #[error("Circular import detected: {cycle}")]
    #[diagnostic(code(loader::circular_import))]
    CircularImport { cycle: String },

    #[error("Module \"{name}\" cannot include itself")]
    #[diagnostic(code(loader::self_include))]
    SelfInclude { name: String },

    #[error("Submodule \"{submodule}\" belongs to \"{found}\", not to \"{expected}\"")]
    #[diagnostic(code(loader::belongs_to_mismatch))]
    BelongsToMismatch {
        submodule: String,
        expected: String,
        found: String,
    },

    #[error("Input data contains submodule \"{name}\" which cannot be parsed without its main module")]
    #[diagnostic(code(loader::submodule_standalone))]
    SubmoduleStandalone { name: String },

    #[error("Expected submodule \"{expected}\", but the source contains module \"{found}\"")]
    #[diagnostic(code(loader::expected_submodule))]
    ExpectedSubmodule { expected: String, found: String },

    #[error("Requested \"{name}\" but the source defines \"{found}\"")]
    #[diagnostic(code(loader::name_mismatch))]
    NameMismatch { name: String, found: String },

    #[error("Requested revision {expected} of \"{name}\" but the source provides {}", .found.as_deref().unwrap_or("none"))]
    #[diagnostic(code(loader::revision_mismatch))]
    RevisionMismatch {
        name: String,
        expected: String,
        found: Option<String>,
    },

    #[error("Module \"{module}\" rejected by custom check: {reason}")]
    #[diagnostic(code(loader::custom_check))]
    CustomCheck { module: String, reason: String },

    #[error("Failed to read \"{path}\": {message}")]
    #[diagnostic(code(loader::io))]
    Io { path: String, message: String },

    #[error("Unsupported input: {reason}")]
    #[diagnostic(code(loader::unsupported_input))]
    UnsupportedInput { reason: String },
}

impl LoadError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::ModuleNotFound { .. } | LoadError::SubmoduleNotFound { .. } => {
                ErrorKind::NotFound
            }
            LoadError::Io { .. } | LoadError::UnsupportedInput { .. } => ErrorKind::Io,
            _ => ErrorKind::Policy,
        }
    }
}

fn revision_suffix(revision: &Option<String>) -> String {
    revision
        .as_ref()
        .map(|rev| format!("@{rev}"))
        .unwrap_or_default()
}
