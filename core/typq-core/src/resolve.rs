//! Argument resolution for checks (made by FontLab https://www.fontlab.com/)
//!
//! A check names the inputs it wants. Some are handed over by the runner
//! (the font, the family, the directory, the metadata file, the rasterizer),
//! the rest are conditions: small functions of other inputs whose values are
//! computed on demand and remembered for the subject being checked.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::check::{split_condition, CheckImplementation};
use crate::font::FontFace;
use crate::metadata::FamilyMetadata;
use crate::raster::Rasterizer;
use crate::registry::CheckRegistry;

/// Type-erased input value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Condition body. `Ok(None)` means the value is absent for this subject.
pub type ConditionFn = Arc<dyn Fn(&Args) -> Result<Option<Value>> + Send + Sync>;

pub const INPUT_FONT: &str = "font";
pub const INPUT_FONTS: &str = "fonts";
pub const INPUT_DIRECTORY: &str = "family_directory";
pub const INPUT_METADATA: &str = "family_metadata";
pub const INPUT_RASTERIZER: &str = "rasterizer";

/// Inputs the runner provides directly; every other name is a condition.
pub const PROVIDED_INPUTS: [&str; 5] = [
    INPUT_FONT,
    INPUT_FONTS,
    INPUT_DIRECTORY,
    INPUT_METADATA,
    INPUT_RASTERIZER,
];

pub fn is_provided_input(name: &str) -> bool {
    PROVIDED_INPUTS.contains(&name)
}

/// Named value provider computed from other inputs.
#[derive(Clone)]
pub struct Condition {
    pub name: String,
    pub inputs: Vec<String>,
    compute: ConditionFn,
}

impl Condition {
    pub fn new<F>(name: &str, inputs: &[&str], compute: F) -> Self
    where
        F: Fn(&Args) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            compute: Arc::new(compute),
        }
    }

    /// A condition that always yields a `bool`.
    pub fn flag<F>(name: &str, inputs: &[&str], compute: F) -> Self
    where
        F: Fn(&Args) -> Result<bool> + Send + Sync + 'static,
    {
        Self::new(name, inputs, move |args| {
            let value: Value = Arc::new(compute(args)?);
            Ok(Some(value))
        })
    }

    pub fn compute(&self, args: &Args) -> Result<Option<Value>> {
        (self.compute)(args)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

/// Resolved inputs handed to a predicate or condition.
#[derive(Clone, Default)]
pub struct Args {
    values: HashMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn with<T: Any + Send + Sync>(mut self, name: &str, value: T) -> Self {
        self.insert(name, Arc::new(value));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get<T: Any>(&self, name: &str) -> Result<&T> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| anyhow!("input `{name}` was not resolved"))?;
        (**value)
            .downcast_ref::<T>()
            .ok_or_else(|| anyhow!("input `{name}` has an unexpected type"))
    }

    pub fn font(&self) -> Result<&FontFace> {
        self.get::<Arc<FontFace>>(INPUT_FONT).map(|font| font.as_ref())
    }

    pub fn fonts(&self) -> Result<&[Arc<FontFace>]> {
        self.get::<Vec<Arc<FontFace>>>(INPUT_FONTS).map(Vec::as_slice)
    }

    pub fn metadata(&self) -> Result<&FamilyMetadata> {
        self.get::<Arc<FamilyMetadata>>(INPUT_METADATA)
            .map(|meta| meta.as_ref())
    }

    pub fn directory(&self) -> Result<&Path> {
        self.get::<PathBuf>(INPUT_DIRECTORY).map(PathBuf::as_path)
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        self.get::<bool>(name).copied()
    }

    pub fn rasterizer(&self) -> Option<Arc<dyn Rasterizer>> {
        self.get::<Option<Arc<dyn Rasterizer>>>(INPUT_RASTERIZER)
            .ok()
            .and_then(Clone::clone)
    }
}

/// Why a check was not invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipSignal {
    /// `unavailable-inputs` or `unfulfilled-conditions`.
    pub key: &'static str,
    pub reason: String,
}

impl SkipSignal {
    fn unavailable(names: &[String]) -> Self {
        Self {
            key: "unavailable-inputs",
            reason: format!("Unavailable inputs: {}", names.join(", ")),
        }
    }

    fn unfulfilled(names: &[String]) -> Self {
        Self {
            key: "unfulfilled-conditions",
            reason: format!("Unfulfilled conditions: {}", names.join(", ")),
        }
    }
}

pub enum Resolution {
    Ready(Args),
    Skip(SkipSignal),
}

#[derive(Clone)]
enum Memo {
    Computed(Option<Value>),
    Failed(String),
}

/// Resolves check inputs for one subject, memoizing condition values.
pub struct Resolver<'r> {
    registry: &'r CheckRegistry,
    provided: Args,
    cache: HashMap<String, Memo>,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r CheckRegistry, provided: Args) -> Self {
        Self {
            registry,
            provided,
            cache: HashMap::new(),
        }
    }

    /// Number of conditions evaluated so far for this subject.
    pub fn computed_conditions(&self) -> usize {
        self.cache.len()
    }

    /// Collect the arguments for `check`, or say why it cannot run.
    ///
    /// `Err` means a condition provider itself failed.
    pub fn resolve(&mut self, check: &CheckImplementation) -> Result<Resolution> {
        let mut args = Args::new();
        let mut missing = Vec::new();
        for name in &check.inputs {
            match self.lookup(name)? {
                Some(value) => args.insert(name, value),
                None => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Ok(Resolution::Skip(SkipSignal::unavailable(&missing)));
        }

        let mut unmet = Vec::new();
        for raw in &check.conditions {
            let (name, negated) = split_condition(raw);
            let value = self.lookup(name)?;
            let holds = value.as_ref().map(is_truthy).unwrap_or(false);
            if holds == negated {
                unmet.push(raw.clone());
            }
            if let Some(value) = value {
                args.insert(name, value);
            }
        }
        if !unmet.is_empty() {
            log::debug!("{}: unfulfilled conditions {:?}", check.id, unmet);
            return Ok(Resolution::Skip(SkipSignal::unfulfilled(&unmet)));
        }

        Ok(Resolution::Ready(args))
    }

    fn lookup(&mut self, name: &str) -> Result<Option<Value>> {
        if let Some(value) = self.provided.value(name) {
            return Ok(Some(Arc::clone(value)));
        }
        if is_provided_input(name) {
            return Ok(None);
        }
        if let Some(memo) = self.cache.get(name) {
            return memo_result(name, memo.clone());
        }

        let condition = self
            .registry
            .condition(name)
            .ok_or_else(|| anyhow!("unknown input `{name}`"))?
            .clone();

        let mut args = Args::new();
        for input in &condition.inputs {
            match self.lookup(input)? {
                Some(value) => args.insert(input, value),
                None => {
                    self.cache.insert(name.to_string(), Memo::Computed(None));
                    return Ok(None);
                }
            }
        }

        let memo = match catch_unwind(AssertUnwindSafe(|| condition.compute(&args))) {
            Ok(Ok(value)) => Memo::Computed(value),
            Ok(Err(err)) => Memo::Failed(format!("{err:#}")),
            Err(payload) => Memo::Failed(panic_message(payload)),
        };
        log::debug!("computed condition `{name}`");
        self.cache.insert(name.to_string(), memo.clone());
        memo_result(name, memo)
    }
}

fn memo_result(name: &str, memo: Memo) -> Result<Option<Value>> {
    match memo {
        Memo::Computed(value) => Ok(value),
        Memo::Failed(message) => Err(anyhow!("condition `{name}` failed: {message}")),
    }
}

/// A `bool` value is its own truth; any other present value counts as met.
fn is_truthy(value: &Value) -> bool {
    (**value).downcast_ref::<bool>().copied().unwrap_or(true)
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
