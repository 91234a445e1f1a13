//! Streaming JSON writer.
//!
//! Layout and escaping come from serde_json's [`Formatter`]s; this type adds the
//! container bookkeeping and the deferred member names.

use std::fmt;
use std::io;

use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};

use crate::error::{CodecError, CodecResult};

/// Output options for [`JsonWriter`].
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Write `"name":null` for null object members. When false, the member is dropped.
    pub serialize_nulls: bool,
    /// Indentation per nesting level. `None` writes compact output.
    pub indent: Option<&'static str>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            serialize_nulls: true,
            indent: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Array,
    Object,
}

struct Frame {
    scope: Scope,
    first: bool,
}

enum Style {
    Compact(CompactFormatter),
    Pretty(PrettyFormatter<'static>),
}

/// Calls the same formatter method for either style.
macro_rules! emit {
    ($writer:ident, $method:ident $(, $arg:expr)*) => {
        match &mut $writer.style {
            Style::Compact(formatter) => formatter.$method(&mut $writer.out $(, $arg)*),
            Style::Pretty(formatter) => formatter.$method(&mut $writer.out $(, $arg)*),
        }
    };
}

/// Writes a JSON document into an owned buffer.
///
/// Object member names are deferred until the member's value is written, so a null
/// value can drop its name when [`WriterConfig::serialize_nulls`] is off.
pub struct JsonWriter {
    out: Vec<u8>,
    style: Style,
    frames: Vec<Frame>,
    deferred_name: Option<String>,
    /// A top-level value has been started
    started: bool,
    config: WriterConfig,
}

impl fmt::Debug for JsonWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonWriter")
            .field("depth", &self.frames.len())
            .field("deferred_name", &self.deferred_name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::with_config(WriterConfig::default())
    }

    pub fn with_config(config: WriterConfig) -> Self {
        let style = match config.indent {
            Some(indent) => Style::Pretty(PrettyFormatter::with_indent(indent.as_bytes())),
            None => Style::Compact(CompactFormatter),
        };
        Self {
            out: Vec::new(),
            style,
            frames: Vec::new(),
            deferred_name: None,
            started: false,
            config,
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn begin_object(&mut self) -> CodecResult<()> {
        self.before_value()?;
        emit!(self, begin_object)?;
        self.frames.push(Frame {
            scope: Scope::Object,
            first: true,
        });
        Ok(())
    }

    pub fn end_object(&mut self) -> CodecResult<()> {
        self.close(Scope::Object)?;
        emit!(self, end_object)?;
        self.after_value()
    }

    pub fn begin_array(&mut self) -> CodecResult<()> {
        self.before_value()?;
        emit!(self, begin_array)?;
        self.frames.push(Frame {
            scope: Scope::Array,
            first: true,
        });
        Ok(())
    }

    pub fn end_array(&mut self) -> CodecResult<()> {
        self.close(Scope::Array)?;
        emit!(self, end_array)?;
        self.after_value()
    }

    /// Sets the name of the next object member.
    pub fn name(&mut self, name: &str) -> CodecResult<()> {
        if self.deferred_name.is_some() {
            return Err(CodecError::IllegalState(format!(
                "name {name:?} written while another name is pending"
            )));
        }
        if self.scope() != Some(Scope::Object) {
            return Err(CodecError::IllegalState(format!(
                "name {name:?} written outside of an object"
            )));
        }
        self.deferred_name = Some(name.to_owned());
        Ok(())
    }

    pub fn null_value(&mut self) -> CodecResult<()> {
        if self.deferred_name.is_some() && !self.config.serialize_nulls {
            self.deferred_name = None;
            return Ok(());
        }
        self.before_value()?;
        emit!(self, write_null)?;
        self.after_value()
    }

    pub fn value_str(&mut self, value: &str) -> CodecResult<()> {
        self.before_value()?;
        self.write_escaped(value)?;
        self.after_value()
    }

    pub fn value_bool(&mut self, value: bool) -> CodecResult<()> {
        self.before_value()?;
        emit!(self, write_bool, value)?;
        self.after_value()
    }

    pub fn value_i64(&mut self, value: i64) -> CodecResult<()> {
        self.before_value()?;
        emit!(self, write_i64, value)?;
        self.after_value()
    }

    pub fn value_u64(&mut self, value: u64) -> CodecResult<()> {
        self.before_value()?;
        emit!(self, write_u64, value)?;
        self.after_value()
    }

    pub fn value_f64(&mut self, value: f64) -> CodecResult<()> {
        if !value.is_finite() {
            return Err(CodecError::NonFiniteNumber(value));
        }
        self.before_value()?;
        emit!(self, write_f64, value)?;
        self.after_value()
    }

    /// Writes an `f32` using its own shortest representation rather than the widened `f64`.
    pub fn value_f32(&mut self, value: f32) -> CodecResult<()> {
        if !value.is_finite() {
            return Err(CodecError::NonFiniteNumber(f64::from(value)));
        }
        self.before_value()?;
        emit!(self, write_f32, value)?;
        self.after_value()
    }

    /// Returns the document. Fails unless exactly one complete top-level value was written.
    pub fn into_string(self) -> CodecResult<String> {
        if !self.started || !self.frames.is_empty() || self.deferred_name.is_some() {
            return Err(CodecError::IllegalState("incomplete document".to_owned()));
        }
        String::from_utf8(self.out).map_err(|err| CodecError::IllegalState(err.to_string()))
    }

    fn scope(&self) -> Option<Scope> {
        self.frames.last().map(|frame| frame.scope)
    }

    /// Clears the `first` flag of the innermost container, returning its old value.
    fn mark_written(&mut self) -> bool {
        self.frames
            .last_mut()
            .is_some_and(|frame| std::mem::replace(&mut frame.first, false))
    }

    fn before_value(&mut self) -> CodecResult<()> {
        if let Some(name) = self.deferred_name.take() {
            let first = self.mark_written();
            emit!(self, begin_object_key, first)?;
            self.write_escaped(&name)?;
            emit!(self, end_object_key)?;
            emit!(self, begin_object_value)?;
            return Ok(());
        }
        match self.scope() {
            Some(Scope::Array) => {
                let first = self.mark_written();
                emit!(self, begin_array_value, first)?;
            }
            Some(Scope::Object) => {
                return Err(CodecError::IllegalState(
                    "object member written without a name".to_owned(),
                ));
            }
            None if self.started => {
                return Err(CodecError::IllegalState(
                    "JSON must have only one top-level value".to_owned(),
                ));
            }
            None => self.started = true,
        }
        Ok(())
    }

    fn after_value(&mut self) -> CodecResult<()> {
        match self.scope() {
            Some(Scope::Array) => emit!(self, end_array_value)?,
            Some(Scope::Object) => emit!(self, end_object_value)?,
            None => {}
        }
        Ok(())
    }

    fn close(&mut self, scope: Scope) -> CodecResult<()> {
        if let Some(name) = &self.deferred_name {
            return Err(CodecError::IllegalState(format!("dangling name {name:?}")));
        }
        if self.scope() != Some(scope) {
            return Err(CodecError::IllegalState(format!(
                "{scope:?} end does not match the innermost container"
            )));
        }
        self.frames.pop();
        Ok(())
    }

    fn write_escaped(&mut self, value: &str) -> CodecResult<()> {
        serde_json::to_writer(&mut self.out, value).map_err(io::Error::from)?;
        Ok(())
    }
}
