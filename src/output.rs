use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ComparableReport, IngestReport, OrthologReport};
use crate::compose::ResolvedQueryScope;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_ingest(result: &IngestReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_orthologs(result: &OrthologReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_comparable(result: &ComparableReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_scope(result: &ResolvedQueryScope) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
