//! Zip container for Vcap files

use std::collections::HashSet;
use std::io::{Seek, Write};

use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::context::ArchiveCompression;
use crate::core::{Error, Result};

/// Frame document
pub const WORLD_ENTRY: &str = "world.dat";
/// Texture atlas
pub const ATLAS_ENTRY: &str = "tex/world.png";
/// Archive metadata
pub const META_ENTRY: &str = "meta.json";

/// Entry name of a mesh
pub fn mesh_entry(id: &str) -> String {
    format!("mesh/{id}.obj")
}

/// Entry name of a material
pub fn material_entry(name: &str) -> String {
    format!("mat/{name}.json")
}

/// Archive-level metadata read by players before any mesh
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcapMeta {
    /// Highest material layer count of any mesh
    pub num_layers: u32,
}

impl From<ArchiveCompression> for CompressionMethod {
    fn from(compression: ArchiveCompression) -> Self {
        match compression {
            ArchiveCompression::Stored => CompressionMethod::Stored,
            ArchiveCompression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// Ordered archive writer with unique entry names.
///
/// Every entry carries the same fixed timestamp, so identical content
/// yields identical bytes.
pub struct VcapArchive<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    names: HashSet<String>,
    entries: Vec<String>,
}

impl<W: Write + Seek> VcapArchive<W> {
    pub fn new(out: W, compression: ArchiveCompression) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(compression.into())
            .last_modified_time(zip::DateTime::default());
        Self {
            zip: ZipWriter::new(out),
            options,
            names: HashSet::new(),
            entries: Vec::new(),
        }
    }

    /// Start entry `name` and fill it through `write`
    pub fn write_entry<F>(&mut self, name: &str, write: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        if !self.names.insert(name.to_string()) {
            return Err(Error::DuplicateEntry(name.to_string()));
        }
        self.zip.start_file(name, self.options)?;
        write(&mut self.zip)?;
        self.entries.push(name.to_string());
        Ok(())
    }

    /// Entry names in write order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Write the central directory and return the output
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn test_duplicate_names_rejected() {
        let mut archive = VcapArchive::new(Cursor::new(Vec::new()), ArchiveCompression::Deflated);
        archive.write_entry(&mesh_entry("model_0"), |w| Ok(w.write_all(b"# a")?)).unwrap();
        let again = archive.write_entry(&mesh_entry("model_0"), |w| Ok(w.write_all(b"# b")?));
        assert!(matches!(again, Err(Error::DuplicateEntry(name)) if name == "mesh/model_0.obj"));
        assert_eq!(archive.entries(), ["mesh/model_0.obj"]);
    }

    #[test]
    fn test_entries_readable_in_order() {
        let mut archive = VcapArchive::new(Cursor::new(Vec::new()), ArchiveCompression::Stored);
        archive.write_entry(WORLD_ENTRY, |w| Ok(w.write_all(b"nbt")?)).unwrap();
        archive
            .write_entry(META_ENTRY, |w| Ok(serde_json::to_writer(w, &VcapMeta { num_layers: 2 })?))
            .unwrap();
        let bytes = archive.finish().unwrap().into_inner();

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<_> = zip.file_names().map(str::to_string).collect();
        assert_eq!(names.len(), 2);
        assert_eq!(zip.by_index(0).unwrap().name(), WORLD_ENTRY);

        let mut meta = String::new();
        zip.by_name(META_ENTRY).unwrap().read_to_string(&mut meta).unwrap();
        assert_eq!(meta, r#"{"numLayers":2}"#);
    }

    #[test]
    fn test_layout_deterministic() {
        let build = || {
            let mut archive = VcapArchive::new(Cursor::new(Vec::new()), ArchiveCompression::Deflated);
            archive.write_entry(&material_entry("world"), |w| Ok(w.write_all(b"{}")?)).unwrap();
            archive.finish().unwrap().into_inner()
        };
        assert_eq!(build(), build());
    }
}
