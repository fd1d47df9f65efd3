use crate::core::io::traits::StructureFile;
use crate::core::models::lattice::Lattice;
use crate::core::models::site::{Site, Species};
use crate::core::models::structure::Structure;
use nalgebra::{Matrix3, Point3, Vector3};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Missing required record: {0}")]
    MissingRecord(&'static str),
}

/// The lattice file format used by the ATAT tool suite (`rndstr.in`, `bestsqs.out`).
///
/// The layout is a coordinate system (three Cartesian vectors, or a single
/// `a b c alpha beta gamma` line), three lattice vectors expressed in that
/// coordinate system, and one line per site with its position in the same
/// coordinate system followed by its occupation. The occupation is either a
/// bare element (`Au`) or a comma-separated list of `Element=occupancy` pairs
/// (`Au=0.5,Cu=0.5`).
///
/// The writer always emits the Cartesian lattice as the coordinate system,
/// the identity as the lattice vectors, and fractional site positions.
pub struct AtatFile;

impl AtatFile {
    /// Writes the cell-shape override consumed by `mcsqs -rc`.
    ///
    /// The file always holds a single identity supercell, which makes the
    /// search keep the written structure's own cell.
    pub fn write_identity_cell(writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "1")?;
        writeln!(writer, "1 0 0")?;
        writeln!(writer, "0 1 0")?;
        writeln!(writer, "0 0 1")?;
        Ok(())
    }
}

impl StructureFile for AtatFile {
    type Metadata = ();
    type Error = AtatError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if !tokens.is_empty() {
                rows.push((line_num + 1, tokens));
            }
        }
        let mut rows = rows.into_iter();

        let coordinate_system = read_coordinate_system(&mut rows)?;

        let mut lattice_rows = Vec::with_capacity(3);
        for _ in 0..3 {
            let (line, tokens) = rows
                .next()
                .ok_or(AtatError::MissingRecord("lattice vectors"))?;
            let v = parse_vector(&tokens, line)?;
            lattice_rows.push(coordinate_system.transpose() * v);
        }
        let lattice = Lattice::from_vectors(lattice_rows[0], lattice_rows[1], lattice_rows[2]);

        let mut sites = Vec::new();
        for (line, tokens) in rows {
            if tokens.len() < 4 {
                return Err(AtatError::Parse {
                    line,
                    message: "site line requires three coordinates and an occupation".into(),
                });
            }
            let position = parse_vector(&tokens[..3], line)?;
            let cartesian = Point3::from(coordinate_system.transpose() * position);
            let frac_coords = lattice
                .to_fractional(&cartesian)
                .ok_or(AtatError::Parse {
                    line,
                    message: "lattice vectors are linearly dependent".into(),
                })?;
            let species = parse_occupation(&tokens[3..].join(""), line)?;
            sites.push(Site::new(species, frac_coords));
        }

        if sites.is_empty() {
            return Err(AtatError::MissingRecord("site lines"));
        }
        Ok((Structure::new(lattice, sites), ()))
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        let matrix = structure.lattice.matrix();
        for i in 0..3 {
            writeln!(
                writer,
                "{:.6} {:.6} {:.6}",
                matrix[(i, 0)],
                matrix[(i, 1)],
                matrix[(i, 2)]
            )?;
        }
        writeln!(writer, "1.000000 0.000000 0.000000")?;
        writeln!(writer, "0.000000 1.000000 0.000000")?;
        writeln!(writer, "0.000000 0.000000 1.000000")?;

        for site in &structure.sites {
            let f = site.frac_coords;
            let occupation = if site.is_ordered() {
                site.species[0].element.clone()
            } else {
                site.species
                    .iter()
                    .map(|s| format!("{}={}", s.element, s.occupancy))
                    .collect::<Vec<_>>()
                    .join(",")
            };
            writeln!(writer, "{:.6} {:.6} {:.6} {}", f.x, f.y, f.z, occupation)?;
        }
        Ok(())
    }
}

fn read_coordinate_system(
    rows: &mut impl Iterator<Item = (usize, Vec<String>)>,
) -> Result<Matrix3<f64>, AtatError> {
    let (line, first) = rows
        .next()
        .ok_or(AtatError::MissingRecord("coordinate system"))?;

    if first.len() == 6 {
        let values = parse_floats(&first, line)?;
        let lattice = Lattice::from_parameters(
            [values[0], values[1], values[2]],
            [values[3], values[4], values[5]],
        );
        return Ok(*lattice.matrix());
    }

    let mut vectors = vec![parse_vector(&first, line)?];
    for _ in 0..2 {
        let (line, tokens) = rows
            .next()
            .ok_or(AtatError::MissingRecord("coordinate system"))?;
        vectors.push(parse_vector(&tokens, line)?);
    }
    Ok(Matrix3::from_rows(&[
        vectors[0].transpose(),
        vectors[1].transpose(),
        vectors[2].transpose(),
    ]))
}

fn parse_floats(tokens: &[String], line: usize) -> Result<Vec<f64>, AtatError> {
    tokens
        .iter()
        .map(|t| {
            t.parse::<f64>().map_err(|_| AtatError::Parse {
                line,
                message: format!("invalid number '{}'", t),
            })
        })
        .collect()
}

fn parse_vector(tokens: &[String], line: usize) -> Result<Vector3<f64>, AtatError> {
    if tokens.len() < 3 {
        return Err(AtatError::Parse {
            line,
            message: format!("expected three numbers, found {}", tokens.len()),
        });
    }
    let values = parse_floats(&tokens[..3], line)?;
    Ok(Vector3::new(values[0], values[1], values[2]))
}

fn parse_occupation(text: &str, line: usize) -> Result<Vec<Species>, AtatError> {
    let mut species = Vec::new();
    for entry in text.split(',').filter(|e| !e.is_empty()) {
        match entry.split_once('=') {
            Some((element, occupancy)) => {
                let occupancy: f64 = occupancy.parse().map_err(|_| AtatError::Parse {
                    line,
                    message: format!("invalid occupancy in '{}'", entry),
                })?;
                species.push(Species::new(element, occupancy));
            }
            None => species.push(Species::new(entry, 1.0)),
        }
    }
    if species.is_empty() {
        return Err(AtatError::Parse {
            line,
            message: "empty site occupation".into(),
        });
    }
    Ok(species)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn disordered_cubic() -> Structure {
        let lattice = Lattice::from_parameters([3.6, 3.6, 3.6], [90.0, 90.0, 90.0]);
        Structure::new(
            lattice,
            vec![
                Site::new(
                    vec![Species::new("Cu", 0.5), Species::new("Au", 0.5)],
                    Point3::origin(),
                ),
                Site::ordered("Pd", Point3::new(0.5, 0.5, 0.5)),
            ],
        )
    }

    fn write_to_string(structure: &Structure) -> String {
        let mut buffer = Vec::new();
        AtatFile::write_to(structure, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn writer_emits_lattice_identity_and_sorted_occupations() {
        let text = write_to_string(&disordered_cubic());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "3.600000 0.000000 0.000000");
        assert_eq!(lines[3], "1.000000 0.000000 0.000000");
        assert_eq!(lines[5], "0.000000 0.000000 1.000000");
        assert_eq!(lines[6], "0.000000 0.000000 0.000000 Au=0.5,Cu=0.5");
        assert_eq!(lines[7], "0.500000 0.500000 0.500000 Pd");
    }

    #[test]
    fn reads_mcsqs_output_with_cartesian_coordinate_system() {
        let text = "\
4.000000 0.000000 0.000000
0.000000 4.000000 0.000000
0.000000 0.000000 4.000000
2.000000 0.000000 0.000000
0.000000 1.000000 0.000000
0.000000 0.000000 1.000000
0.000000 0.000000 0.000000 Au
0.500000 0.500000 0.500000 Cu
1.000000 0.000000 0.000000 Cu
1.500000 0.500000 0.500000 Au
";
        let (structure, _) = AtatFile::read_from(&mut Cursor::new(text)).unwrap();
        assert_eq!(structure.num_sites(), 4);
        assert!(structure.is_ordered());
        assert!((structure.lattice.abc()[0] - 8.0).abs() < 1e-9);
        let third = structure.sites[2].frac_coords;
        assert!((third - Point3::new(0.5, 0.0, 0.0)).norm() < 1e-9);
        assert_eq!(structure.sites[3].species[0].element, "Au");
    }

    #[test]
    fn reads_cell_parameter_coordinate_system() {
        let text = "\
3.0 3.0 3.0 90 90 90
1 0 0
0 1 0
0 0 1
0 0 0 Fe=0.25,Ni=0.75
";
        let (structure, _) = AtatFile::read_from(&mut Cursor::new(text)).unwrap();
        assert!(structure.is_disordered());
        assert_eq!(structure.sites[0].species.len(), 2);
        assert!((structure.sites[0].species[1].occupancy - 0.75).abs() < 1e-12);
        assert!((structure.lattice.volume() - 27.0).abs() < 1e-9);
    }

    #[test]
    fn written_structure_is_read_back_with_same_occupations() {
        let original = disordered_cubic();
        let text = write_to_string(&original);
        let (parsed, _) = AtatFile::read_from(&mut Cursor::new(text)).unwrap();
        assert_eq!(parsed.num_sites(), original.num_sites());
        assert_eq!(parsed.composition(), original.composition());
    }

    #[test]
    fn site_without_occupation_is_a_parse_error() {
        let text = "1 0 0\n0 1 0\n0 0 1\n1 0 0\n0 1 0\n0 0 1\n0 0 0\n";
        let result = AtatFile::read_from(&mut Cursor::new(text));
        assert!(matches!(result, Err(AtatError::Parse { line: 7, .. })));
    }

    #[test]
    fn file_without_sites_reports_missing_record() {
        let text = "1 0 0\n0 1 0\n0 0 1\n1 0 0\n0 1 0\n0 0 1\n";
        let result = AtatFile::read_from(&mut Cursor::new(text));
        assert!(matches!(result, Err(AtatError::MissingRecord("site lines"))));
    }

    #[test]
    fn identity_cell_file_is_independent_of_structure() {
        let mut buffer = Vec::new();
        AtatFile::write_identity_cell(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "1\n1 0 0\n0 1 0\n0 0 1\n");
    }
}
