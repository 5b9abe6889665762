//! `multipart/form-data` bodies.
//!
//! # Design
//! Attachments are buffered completely before the request is sent, so the
//! writer targets any `io::Write` and the builder hands it a `Vec<u8>`.
//! Each attachment file is opened, copied and dropped inside one scope,
//! so its descriptor is released on every exit path.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::Error;
use crate::values::Values;

/// Plain field values plus file attachments for a multipart body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub values: Values,
    pub files: Vec<(String, PathBuf)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain form field.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.add(name, value);
        self
    }

    /// Attach the file at `path` under the form field `name`. Re-using a
    /// field name replaces the earlier path.
    pub fn file(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let path = path.into();
        match self.files.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = path,
            None => self.files.push((name, path)),
        }
        self
    }

    /// Encode the form: attachments first, in insertion order, then the
    /// value fields. Returns the body and its `Content-Type`.
    pub fn encode(&self) -> Result<(Vec<u8>, String), Error> {
        let mut writer = MultipartWriter::new(Vec::new());
        for (name, path) in &self.files {
            attach(&mut writer, name, path)?;
        }
        for (name, value) in self.values.pairs() {
            writer.write_field(name, value).map_err(Error::Multipart)?;
        }
        let content_type = writer.content_type();
        let body = writer.finish().map_err(Error::Multipart)?;
        Ok((body, content_type))
    }
}

fn attach<W: Write>(writer: &mut MultipartWriter<W>, name: &str, path: &Path) -> Result<(), Error> {
    let wrap = |source| Error::Attachment {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(wrap)?;
    writer
        .create_form_file(name, &path.to_string_lossy())
        .map_err(wrap)?;
    io::copy(&mut file, writer.inner_mut()).map_err(wrap)?;
    Ok(())
}

/// Streaming writer for `multipart/form-data` framing.
#[derive(Debug)]
pub struct MultipartWriter<W> {
    inner: W,
    boundary: String,
    has_parts: bool,
}

impl<W: Write> MultipartWriter<W> {
    /// Writer with a freshly generated random boundary.
    pub fn new(inner: W) -> Self {
        Self::with_boundary(inner, Uuid::new_v4().simple().to_string())
    }

    pub fn with_boundary(inner: W, boundary: impl Into<String>) -> Self {
        Self {
            inner,
            boundary: boundary.into(),
            has_parts: false,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Start a file part. Its content is whatever is written to
    /// `inner_mut()` until the next part begins.
    pub fn create_form_file(&mut self, name: &str, filename: &str) -> io::Result<()> {
        self.begin_part(&[
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                escape_quotes(name),
                escape_quotes(filename)
            ),
            "Content-Type: application/octet-stream".to_string(),
        ])
    }

    pub fn write_field(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.begin_part(&[format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quotes(name)
        )])?;
        self.inner.write_all(value.as_bytes())
    }

    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Write the closing boundary and hand back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.has_parts {
            write!(self.inner, "\r\n--{}--\r\n", self.boundary)?;
        } else {
            write!(self.inner, "--{}--\r\n", self.boundary)?;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn begin_part(&mut self, headers: &[String]) -> io::Result<()> {
        if self.has_parts {
            write!(self.inner, "\r\n--{}\r\n", self.boundary)?;
        } else {
            write!(self.inner, "--{}\r\n", self.boundary)?;
        }
        self.has_parts = true;
        for header in headers {
            write!(self.inner, "{header}\r\n")?;
        }
        self.inner.write_all(b"\r\n")
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
