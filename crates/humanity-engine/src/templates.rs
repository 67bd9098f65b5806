//! Template loader for actions, local targets, and global targets.
//!
//! Each kind lives in its own whitespace-separated text file inside the
//! template directory. Blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! # name        price duration tags...            modifiers
//! buy_apartment 0     8        home property      $cash>=2000000
//! study         500   4        education career   @engineer_diploma
//! ```
//!
//! Action modifiers: `$lhs<op>rhs` is an eligibility rule, `$item` a
//! required item (repeat to raise the count), `$-item` consumes one item,
//! `@item` produces one, `+N` sets the bonus. Local target lines are
//! `name tag...`; global target lines are `name [power] tag...`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use humanity_agents::goals::Rule;
use humanity_agents::{ActionSpec, Catalog, GlobalTargetSpec, LocalTargetSpec};
use tracing::info;

use crate::error::EngineError;

/// Action file name inside the template directory.
pub const ACTIONS_FILE: &str = "actions.txt";

/// Local target file name inside the template directory.
pub const LOCAL_TARGETS_FILE: &str = "local_targets.txt";

/// Global target file name inside the template directory.
pub const GLOBAL_TARGETS_FILE: &str = "global_targets.txt";

/// Power of a global target line that does not name one.
pub const DEFAULT_POWER: f64 = 1.0;

/// Errors raised while reading template files.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A template file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A line is malformed.
    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        /// File containing the line.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What is wrong.
        reason: String,
    },
}

/// Parsed, not yet compiled, template specs.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    /// Actions in file order.
    pub actions: Vec<ActionSpec>,
    /// Local targets in file order.
    pub locals: Vec<LocalTargetSpec>,
    /// Global targets in file order.
    pub globals: Vec<GlobalTargetSpec>,
}

impl Templates {
    /// Read the three template files from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] naming the file, and the line for parse
    /// failures.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let path = dir.join(ACTIONS_FILE);
        let actions = parse_actions(&read(&path)?, &path)?;
        let path = dir.join(LOCAL_TARGETS_FILE);
        let locals = parse_local_targets(&read(&path)?, &path)?;
        let path = dir.join(GLOBAL_TARGETS_FILE);
        let globals = parse_global_targets(&read(&path)?, &path)?;
        Ok(Self {
            actions,
            locals,
            globals,
        })
    }
}

/// Load and compile the templates in `dir`.
///
/// # Errors
///
/// Returns [`EngineError::Template`] for unreadable or malformed files and
/// [`EngineError::Catalog`] when the templates do not compile.
pub fn load_catalog(dir: &Path) -> Result<Catalog, EngineError> {
    let templates = Templates::load(dir)?;
    info!(
        dir = %dir.display(),
        actions = templates.actions.len(),
        local_targets = templates.locals.len(),
        global_targets = templates.globals.len(),
        "Templates loaded"
    );
    Catalog::build(templates.actions, templates.locals, templates.globals).map_err(|source| {
        EngineError::Catalog {
            dir: dir.to_path_buf(),
            source,
        }
    })
}

fn read(path: &Path) -> Result<String, TemplateError> {
    std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Line parsing
// ---------------------------------------------------------------------------

/// Splits a file into numbered, non-empty, non-comment lines of fields and
/// rejects repeated names.
struct Lines<'a> {
    path: &'a Path,
    seen: BTreeMap<String, usize>,
}

impl<'a> Lines<'a> {
    const fn new(path: &'a Path) -> Self {
        Self {
            path,
            seen: BTreeMap::new(),
        }
    }

    fn fields(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
        text.lines().enumerate().filter_map(|(index, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                None
            } else {
                Some((index.saturating_add(1), line.split_whitespace().collect()))
            }
        })
    }

    fn error(&self, line: usize, reason: impl Into<String>) -> TemplateError {
        TemplateError::Parse {
            path: self.path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }

    fn claim(&mut self, line: usize, name: &str) -> Result<(), TemplateError> {
        if let Some(first) = self.seen.get(name) {
            return Err(self.error(line, format!("duplicate name `{name}` (first defined on line {first})")));
        }
        self.seen.insert(name.to_owned(), line);
        Ok(())
    }

    fn tags(&self, line: usize, fields: &[&str]) -> Result<Vec<String>, TemplateError> {
        if fields.is_empty() {
            return Err(self.error(line, "at least one tag is required"));
        }
        let mut unique = BTreeSet::new();
        Ok(fields
            .iter()
            .filter(|tag| unique.insert(**tag))
            .map(|tag| (*tag).to_owned())
            .collect())
    }
}

/// Parse an action file.
///
/// # Errors
///
/// Returns [`TemplateError::Parse`] for the first malformed line.
pub fn parse_actions(text: &str, path: &Path) -> Result<Vec<ActionSpec>, TemplateError> {
    let mut lines = Lines::new(path);
    let mut actions = Vec::new();

    for (line, fields) in Lines::fields(text) {
        let [name, price, duration, rest @ ..] = fields.as_slice() else {
            return Err(lines.error(line, "expected `name price duration tag...`"));
        };
        lines.claim(line, name)?;

        let price: i64 = price
            .parse()
            .map_err(|err| lines.error(line, format!("invalid price `{price}`: {err}")))?;
        if price < 0 {
            return Err(lines.error(line, "price must not be negative"));
        }
        let duration: u32 = duration
            .parse()
            .map_err(|err| lines.error(line, format!("invalid duration `{duration}`: {err}")))?;
        if duration == 0 {
            return Err(lines.error(line, "duration must be at least one hour"));
        }

        let mut spec = ActionSpec {
            name: (*name).to_owned(),
            price,
            duration,
            ..ActionSpec::default()
        };
        let mut tags = Vec::new();
        for field in rest {
            if let Some(item) = field.strip_prefix("$-") {
                count_item(&mut spec.consumed_items, item).ok_or_else(|| lines.error(line, "empty item after `$-`"))?;
            } else if let Some(body) = field.strip_prefix('$') {
                if Rule::is_comparison(body) {
                    body.parse::<Rule>()
                        .map_err(|err| lines.error(line, err.to_string()))?;
                    spec.rules.push(body.to_owned());
                } else {
                    count_item(&mut spec.required_items, body).ok_or_else(|| lines.error(line, "empty item after `$`"))?;
                }
            } else if let Some(item) = field.strip_prefix('@') {
                count_item(&mut spec.produced_items, item).ok_or_else(|| lines.error(line, "empty item after `@`"))?;
            } else if let Some(bonus) = field.strip_prefix('+') {
                spec.bonus = bonus
                    .parse::<u32>()
                    .map(i64::from)
                    .map_err(|err| lines.error(line, format!("invalid bonus `{field}`: {err}")))?;
            } else {
                tags.push(*field);
            }
        }
        spec.tags = lines.tags(line, &tags)?;
        actions.push(spec);
    }

    Ok(actions)
}

/// Parse a local target file.
///
/// # Errors
///
/// Returns [`TemplateError::Parse`] for the first malformed line.
pub fn parse_local_targets(text: &str, path: &Path) -> Result<Vec<LocalTargetSpec>, TemplateError> {
    let mut lines = Lines::new(path);
    let mut locals = Vec::new();

    for (line, fields) in Lines::fields(text) {
        let [name, tags @ ..] = fields.as_slice() else {
            continue;
        };
        lines.claim(line, name)?;
        locals.push(LocalTargetSpec {
            name: (*name).to_owned(),
            tags: lines.tags(line, tags)?,
        });
    }

    Ok(locals)
}

/// Parse a global target file.
///
/// The second field is read as the power only when it is a number and at
/// least one tag follows it.
///
/// # Errors
///
/// Returns [`TemplateError::Parse`] for the first malformed line.
pub fn parse_global_targets(text: &str, path: &Path) -> Result<Vec<GlobalTargetSpec>, TemplateError> {
    let mut lines = Lines::new(path);
    let mut globals = Vec::new();

    for (line, fields) in Lines::fields(text) {
        let [name, rest @ ..] = fields.as_slice() else {
            continue;
        };
        lines.claim(line, name)?;

        let (power, tags) = match rest {
            [power, tags @ ..] if !tags.is_empty() => match power.parse::<f64>() {
                Ok(power) => (power, tags),
                Err(_) => (DEFAULT_POWER, rest),
            },
            _ => (DEFAULT_POWER, rest),
        };
        if !power.is_finite() || power < 0.0 {
            return Err(lines.error(line, format!("invalid power {power}")));
        }
        globals.push(GlobalTargetSpec {
            name: (*name).to_owned(),
            power,
            tags: lines.tags(line, tags)?,
        });
    }

    Ok(globals)
}

fn count_item(items: &mut BTreeMap<String, i64>, name: &str) -> Option<()> {
    if name.is_empty() {
        return None;
    }
    let count = items.entry(name.to_owned()).or_insert(0);
    *count = count.saturating_add(1);
    Some(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn path() -> PathBuf {
        PathBuf::from("templates/test.txt")
    }

    fn parse_error_line(err: TemplateError) -> usize {
        match err {
            TemplateError::Parse { line, .. } => line,
            TemplateError::Io { .. } => 0,
        }
    }

    #[test]
    fn parses_action_modifiers() {
        let text = "\
# comment
buy_car 5000 3 transport status $cash>=5000 $license $license $-fuel @car +20
";
        let actions = parse_actions(text, &path()).unwrap();
        assert_eq!(actions.len(), 1);
        let action = &actions[0];
        assert_eq!(action.name, "buy_car");
        assert_eq!(action.price, 5000);
        assert_eq!(action.duration, 3);
        assert_eq!(action.bonus, 20);
        assert_eq!(action.tags, vec!["transport", "status"]);
        assert_eq!(action.rules, vec!["cash>=5000"]);
        assert_eq!(action.required_items.get("license"), Some(&2));
        assert_eq!(action.consumed_items.get("fuel"), Some(&1));
        assert_eq!(action.produced_items.get("car"), Some(&1));
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let text = "\n   \n# jog 0 1 health\nwalk 0 1 health\n";
        let actions = parse_actions(text, &path()).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "walk");
    }

    #[test]
    fn reports_the_offending_line() {
        let text = "walk 0 1 health\n\nrun zero 1 health\n";
        let err = parse_actions(text, &path()).unwrap_err();
        assert_eq!(parse_error_line(err), 3);
    }

    #[test]
    fn rejects_unknown_metrics() {
        let err = parse_actions("lend 0 1 money $karma>=3\n", &path()).unwrap_err();
        assert_eq!(parse_error_line(err), 1);
    }

    #[test]
    fn rejects_duplicates_and_missing_tags() {
        let err = parse_actions("walk 0 1 health\nwalk 0 2 health\n", &path()).unwrap_err();
        assert!(err.to_string().contains("first defined on line 1"));

        let err = parse_actions("walk 0 1 +5\n", &path()).unwrap_err();
        assert_eq!(parse_error_line(err), 1);

        let err = parse_local_targets("fit\n", &path()).unwrap_err();
        assert!(err.to_string().contains("at least one tag"));
    }

    #[test]
    fn rejects_zero_duration() {
        assert!(parse_actions("nap 0 0 rest\n", &path()).is_err());
    }

    #[test]
    fn global_power_is_optional() {
        let text = "career 2.5 money career\nhealthy health sport\nsolo 3\n";
        let globals = parse_global_targets(text, &path()).unwrap();
        assert!((globals[0].power - 2.5).abs() < f64::EPSILON);
        assert_eq!(globals[0].tags, vec!["money", "career"]);
        assert!((globals[1].power - DEFAULT_POWER).abs() < f64::EPSILON);
        assert_eq!(globals[1].tags, vec!["health", "sport"]);
        assert_eq!(globals[2].tags, vec!["3"]);
    }

    #[test]
    fn bundled_templates_compile() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data");
        let catalog = load_catalog(&dir).unwrap();
        assert!(catalog.global_by_name("happy_family").is_some());
        for name in ["find_job", "meet_new_person", "buy_apartment"] {
            assert!(catalog.actions().iter().any(|a| a.name == name), "missing {name}");
        }
        assert!(catalog.globals().iter().all(|g| !g.possible.is_empty()));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let err = Templates::load(Path::new("/nonexistent/templates")).unwrap_err();
        assert!(matches!(err, TemplateError::Io { .. }));
    }
}
