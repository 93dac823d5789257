use crate::error::{OnboardError, Result};
use crate::io;
use crate::names;
use crate::pipeline::{RuntimeValues, Step};
use crate::systemd::{SystemdCommand, UnitManager};
use crate::template::FileTemplate;
use crate::value::ValueRegistry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// An operation performed while onboarding a device.
///
/// Names must be unique across every configuration document that is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub struct Action {
    pub name: String,
    pub kind: ActionKind,
}

#[derive(Debug, Clone)]
pub enum ActionKind {
    /// Provision a file.
    File(FileAction),
    /// Operate on a systemd unit.
    Systemd(SystemdAction),
}

#[derive(Serialize, Deserialize)]
struct RawAction {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<FileAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    systemd: Option<SystemdAction>,
}

impl TryFrom<RawAction> for Action {
    type Error = String;

    fn try_from(raw: RawAction) -> std::result::Result<Self, Self::Error> {
        let kind = match (raw.file, raw.systemd) {
            (Some(f), None) => ActionKind::File(f),
            (None, Some(s)) => ActionKind::Systemd(s),
            _ => {
                return Err(format!(
                    "action {:?}: exactly one of 'file' or 'systemd' must be specified",
                    raw.name
                ))
            }
        };
        Ok(Action {
            name: raw.name,
            kind,
        })
    }
}

impl From<Action> for RawAction {
    fn from(a: Action) -> Self {
        let (file, systemd) = match a.kind {
            ActionKind::File(f) => (Some(f), None),
            ActionKind::Systemd(s) => (None, Some(s)),
        };
        RawAction {
            name: a.name,
            file,
            systemd,
        }
    }
}

impl Action {
    pub fn file(name: impl Into<String>, file: FileAction) -> Self {
        Self {
            name: name.into(),
            kind: ActionKind::File(file),
        }
    }

    pub fn systemd(name: impl Into<String>, systemd: SystemdAction) -> Self {
        Self {
            name: name.into(),
            kind: ActionKind::Systemd(systemd),
        }
    }

    /// Check the action against the declared values. File templates are
    /// compiled and cached here.
    pub fn validate(&mut self, values: ValueRegistry<'_>) -> std::result::Result<(), String> {
        if self.name.is_empty() {
            return Err("action name cannot be empty".to_string());
        }
        let mut errs = Vec::new();
        if !names::is_valid_name(&self.name) {
            errs.push(names::name_mismatch("action", &self.name));
        }
        let res = match &mut self.kind {
            ActionKind::File(f) => f.validate(values),
            ActionKind::Systemd(s) => s.validate(),
        };
        if let Err(e) = res {
            errs.push(format!("action {:?}: {e}", self.name));
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(errs.join("; "))
        }
    }

    /// Build the executable step for this action. Must follow a successful
    /// [`Action::validate`].
    pub fn compile(&self, units: Arc<dyn UnitManager>) -> Result<Box<dyn Step>> {
        match &self.kind {
            ActionKind::File(f) => f.compile(),
            ActionKind::Systemd(s) => s.compile(units),
        }
    }
}

// ---------------------------------------------------------------------------
// FileAction
// ---------------------------------------------------------------------------

/// Where a provisioned file's contents come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Copy the named runtime value verbatim.
    Value(String),
    /// Render a template against every runtime value.
    Template(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawFileAction", into = "RawFileAction")]
pub struct FileAction {
    /// Location on disk where the file is written.
    pub path: String,
    pub source: FileSource,
    compiled: Option<Arc<FileTemplate>>,
}

#[derive(Serialize, Deserialize)]
struct RawFileAction {
    #[serde(default)]
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template: Option<String>,
}

impl TryFrom<RawFileAction> for FileAction {
    type Error = String;

    fn try_from(raw: RawFileAction) -> std::result::Result<Self, Self::Error> {
        let source = match (raw.value, raw.template) {
            (Some(v), None) => FileSource::Value(v),
            (None, Some(t)) => FileSource::Template(t),
            _ => {
                return Err(format!(
                    "file {:?}: exactly one of 'value' or 'template' must be specified",
                    raw.path
                ))
            }
        };
        Ok(FileAction {
            path: raw.path,
            source,
            compiled: None,
        })
    }
}

impl From<FileAction> for RawFileAction {
    fn from(f: FileAction) -> Self {
        let (value, template) = match f.source {
            FileSource::Value(v) => (Some(v), None),
            FileSource::Template(t) => (None, Some(t)),
        };
        RawFileAction {
            path: f.path,
            value,
            template,
        }
    }
}

impl FileAction {
    pub fn from_value(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: FileSource::Value(value.into()),
            compiled: None,
        }
    }

    pub fn from_template(path: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: FileSource::Template(template.into()),
            compiled: None,
        }
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    fn validate(&mut self, values: ValueRegistry<'_>) -> std::result::Result<(), String> {
        if self.path.is_empty() {
            return Err("file path cannot be empty".to_string());
        }
        let mut errs = Vec::new();
        match &self.source {
            FileSource::Value(name) => {
                if name.is_empty() {
                    errs.push("file value must point at a defined value".to_string());
                } else if !values.contains(name) {
                    errs.push(format!("file value {name:?} was not found"));
                }
            }
            FileSource::Template(source) => {
                if source.is_empty() {
                    errs.push("file template cannot be empty".to_string());
                } else {
                    match FileTemplate::compile(source) {
                        Ok(t) => self.compiled = Some(Arc::new(t)),
                        Err(e) => errs.push(format!("failed to parse template: {e}")),
                    }
                }
            }
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(errs.join("; "))
        }
    }

    fn compile(&self) -> Result<Box<dyn Step>> {
        let path = PathBuf::from(&self.path);
        match &self.source {
            FileSource::Value(name) => Ok(Box::new(WriteValue {
                path,
                value: name.clone(),
            })),
            FileSource::Template(_) => {
                let template = self
                    .compiled
                    .clone()
                    .ok_or_else(|| OnboardError::TemplateNotCompiled(self.path.clone()))?;
                Ok(Box::new(RenderTemplate { path, template }))
            }
        }
    }
}

/// Writes one runtime value to a file. An absent value writes an empty file.
struct WriteValue {
    path: PathBuf,
    value: String,
}

impl Step for WriteValue {
    fn run(&self, values: &RuntimeValues) -> Result<()> {
        let data = values.get(&self.value).map(String::as_str).unwrap_or("");
        io::write_file(&self.path, data.as_bytes())
    }
}

struct RenderTemplate {
    path: PathBuf,
    template: Arc<FileTemplate>,
}

impl Step for RenderTemplate {
    fn run(&self, values: &RuntimeValues) -> Result<()> {
        let rendered = self
            .template
            .render(values)
            .map_err(OnboardError::TemplateRender)?;
        io::write_file(&self.path, rendered.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// SystemdAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemdAction {
    /// The unit to operate on.
    #[serde(default)]
    pub unit: String,
    /// One of `start`, `stop`, `restart`, `enable`, `disable`; anything else
    /// is a validation error.
    #[serde(default)]
    pub command: String,
}

impl SystemdAction {
    pub fn new(unit: impl Into<String>, command: SystemdCommand) -> Self {
        Self {
            unit: unit.into(),
            command: command.as_str().to_string(),
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let mut errs = Vec::new();
        if self.unit.is_empty() {
            errs.push("unit name cannot be empty".to_string());
        } else if !names::is_valid_unit_name(&self.unit) {
            errs.push(names::unit_mismatch(&self.unit));
        }
        if names::unit_name_too_long(&self.unit) {
            errs.push(names::unit_too_long());
        }
        if let Err(e) = self.command.parse::<SystemdCommand>() {
            errs.push(e);
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(errs.join("; "))
        }
    }

    fn compile(&self, units: Arc<dyn UnitManager>) -> Result<Box<dyn Step>> {
        let command = self
            .command
            .parse::<SystemdCommand>()
            .map_err(|e| OnboardError::Validation(vec![e]))?;
        Ok(Box::new(RunUnitCommand {
            unit: self.unit.clone(),
            command,
            units,
        }))
    }
}

/// Issues a systemd command. Runtime values are not consulted.
struct RunUnitCommand {
    unit: String,
    command: SystemdCommand,
    units: Arc<dyn UnitManager>,
}

impl Step for RunUnitCommand {
    fn run(&self, _values: &RuntimeValues) -> Result<()> {
        self.units.run(self.command, &self.unit)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
