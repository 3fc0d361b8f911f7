use crate::core::models::molecule::{Molecule, PositionTable};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for structure formats that act as coordinate templates.
///
/// A template is read once into a [`Molecule`]; results are written back by copying the
/// template and substituting updated coordinates, so every non-coordinate byte survives.
pub trait MoleculeFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a molecule from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Molecule, Self::Error>;

    /// Copies `template` to `writer`, replacing the coordinates of every atom with the
    /// matching entry of `positions`.
    ///
    /// # Return
    ///
    /// Returns the number of atom records that were rewritten.
    ///
    /// # Errors
    ///
    /// Returns an error if an atom record cannot be matched or writing fails. Output written
    /// before the failure is left in place.
    fn write_positions(
        template: &mut impl BufRead,
        positions: &PositionTable,
        writer: &mut impl Write,
    ) -> Result<usize, Self::Error>;

    /// Reads a molecule from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Molecule, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Rewrites the template at `template_path` into a new file at `output_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be opened or the rewrite fails.
    fn write_positions_to_path<P: AsRef<Path>, Q: AsRef<Path>>(
        template_path: P,
        positions: &PositionTable,
        output_path: Q,
    ) -> Result<usize, Self::Error> {
        let mut reader = BufReader::new(File::open(template_path)?);
        let mut writer = BufWriter::new(File::create(output_path)?);
        let count = Self::write_positions(&mut reader, positions, &mut writer)?;
        writer.flush()?;
        Ok(count)
    }
}
