//! helper trait for writing xml

use std::io;
use std::ops::Deref;
use xml::writer::{events::XmlEvent, EventWriter, Result};

/// helper trait for writing xml
pub trait XmlWriterExt {
    /// write xml stack
    fn stack(&mut self, name: &str, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()>;

    /// write xml element
    fn element(&mut self, name: &str, data: &str) -> Result<()>;

    /// write xml optional element
    fn opt_element(&mut self, name: &str, data: Option<impl Deref<Target = str>>) -> Result<()>;
}

impl<W: io::Write> XmlWriterExt for EventWriter<W> {
    fn stack(&mut self, name: &str, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.write(XmlEvent::start_element(name))?;
        f(self)?;
        self.write(XmlEvent::end_element())
    }

    fn element(&mut self, name: &str, data: &str) -> Result<()> {
        self.write(XmlEvent::start_element(name))?;
        self.write(XmlEvent::characters(data))?;
        self.write(XmlEvent::end_element())
    }

    fn opt_element(&mut self, name: &str, data: Option<impl Deref<Target = str>>) -> Result<()> {
        match data {
            Some(data) => self.element(name, &data),
            None => Ok(()),
        }
    }
}
