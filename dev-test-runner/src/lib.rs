//! Fixture-driven checks for `tagged-json`.
//!
//! A fixture file names a model enum and lists cases. Each case decodes its
//! input into the model and then either expects an error matching a regex,
//! or re-encodes the value and compares it with the expected output (the
//! input itself when no output is given).
pub mod models;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tagged_json::TaggedEnum;

use crate::models::{CartEvent, Expr, Letters, Scalar};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelName {
    CartEvent,
    Letters,
    Scalar,
    Expr,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    pub model: ModelName,
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Case {
    pub name: String,
    /// input document
    #[serde(default)]
    pub input: Option<Value>,
    /// input text, for documents a `Value` can't hold (duplicate keys, bad syntax)
    #[serde(default)]
    pub raw: Option<String>,
    /// expected re-encoded document; defaults to `input`
    #[serde(default)]
    pub output: Option<Value>,
    /// regex the decode error must match
    #[serde(default)]
    pub error: Option<String>,
    /// expected `Display` rendering of the decoded value
    #[serde(default)]
    pub display: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedFixture {
    pub path: PathBuf,
    pub fixture: Fixture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CaseReport {
    pub file: PathBuf,
    pub name: String,
    pub outcome: Outcome,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// A model enum the runner knows how to exercise.
trait Model: TaggedEnum {
    fn render(&self) -> Option<String> {
        None
    }
}

impl Model for CartEvent {}
impl Model for Letters {}
impl Model for Scalar {}

impl Model for Expr {
    fn render(&self) -> Option<String> {
        Some(self.to_string())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LOADING
// ————————————————————————————————————————————————————————————————————————————

pub fn load_fixtures<I>(patterns: I) -> anyhow::Result<Vec<LoadedFixture>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut fixtures = resolve_file_path_patterns(patterns)?
        .into_iter()
        .map(|path| {
            let fixture = load_fixture(&path)?;
            Ok(LoadedFixture { path, fixture })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    fixtures.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(fixtures)
}

pub fn load_fixture(path: &Path) -> anyhow::Result<Fixture> {
    let source = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let de = &mut serde_json::Deserializer::from_str(&source);
    serde_path_to_error::deserialize(de).with_context(|| format!("parsing fixture {}", path.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let before = out.len();
        for entry in glob::glob(pattern)? {
            out.push(entry?);
        }
        if out.len() == before {
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// RUNNING
// ————————————————————————————————————————————————————————————————————————————

/// Run every case whose `file::name` matches `filter`, in parallel.
/// Reports come back in fixture order.
pub fn run_fixtures(fixtures: &[LoadedFixture], filter: Option<&Regex>) -> Vec<CaseReport> {
    fixtures
        .iter()
        .flat_map(|loaded| loaded.fixture.cases.iter().map(move |case| (loaded, case)))
        .filter(|(loaded, case)| filter.is_none_or(|re| re.is_match(&case_id(&loaded.path, &case.name))))
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(loaded, case)| CaseReport {
            file: loaded.path.clone(),
            name: case.name.clone(),
            outcome: run_case(loaded.fixture.model, case),
        })
        .collect()
}

pub fn case_id(file: &Path, name: &str) -> String {
    let stem = file.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    format!("{stem}::{name}")
}

pub fn run_case(model: ModelName, case: &Case) -> Outcome {
    let result = match model {
        ModelName::CartEvent => check::<CartEvent>(case),
        ModelName::Letters => check::<Letters>(case),
        ModelName::Scalar => check::<Scalar>(case),
        ModelName::Expr => check::<Expr>(case),
    };
    match result {
        Ok(()) => Outcome::Passed,
        Err(error) => Outcome::Failed(format!("{error:#}")),
    }
}

fn check<E: Model>(case: &Case) -> anyhow::Result<()> {
    let bytes = match (&case.raw, &case.input) {
        (Some(raw), None) => raw.clone().into_bytes(),
        (None, Some(input)) => serde_json::to_vec(input)?,
        _ => bail!("case needs exactly one of `input` or `raw`"),
    };

    let decoded = tagged_json::from_slice::<E>(&bytes);
    let value = match (decoded, &case.error) {
        (Ok(_), Some(pattern)) => bail!("decoded fine, expected an error matching /{pattern}/"),
        (Err(error), Some(pattern)) => {
            let message = error.to_string();
            let re = Regex::new(pattern).with_context(|| format!("bad error pattern /{pattern}/"))?;
            if !re.is_match(&message) {
                bail!("error {message:?} doesn't match /{pattern}/");
            }
            return Ok(());
        }
        (Err(error), None) => return Err(anyhow::Error::new(error).context("decoding")),
        (Ok(value), None) => value,
    };

    if let Some(expected) = &case.display {
        match value.render() {
            Some(rendered) if &rendered == expected => {}
            Some(rendered) => bail!("rendered as {rendered:?}, expected {expected:?}"),
            None => bail!("model has no display form"),
        }
    }

    let text = tagged_json::to_string(&value).context("re-encoding")?;
    let schema = tagged_json::schema::<E>()?;
    let prefix = format!("{{{}:", serde_json::to_string(schema.tag_field())?);
    if !text.starts_with(&prefix) {
        bail!("tag field isn't first in {text}");
    }

    let expected = match (&case.output, &case.input) {
        (Some(output), _) | (None, Some(output)) => output,
        (None, None) => bail!("case with `raw` input needs an `output`"),
    };
    let actual: Value = serde_json::from_str(&text)?;
    if &actual != expected {
        bail!("re-encoded as {actual}, expected {expected}");
    }

    // The re-encoded form must decode to the same document again.
    let again = tagged_json::from_str::<E>(&text).context("decoding the re-encoded form")?;
    let again = tagged_json::to_value(&again)?;
    if again != actual {
        bail!("second round trip produced {again}");
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
