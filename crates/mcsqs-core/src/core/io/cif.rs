use crate::core::io::traits::StructureFile;
use crate::core::models::lattice::Lattice;
use crate::core::models::site::{OCCUPANCY_TOLERANCE, Site, Species};
use crate::core::models::structure::Structure;
use nalgebra::{Matrix3, Point3, Vector3};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Two fractional positions closer than this (per axis, modulo the cell) are the same site.
const POSITION_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Error)]
pub enum CifError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Invalid symmetry operation '{0}'")]
    InvalidSymmetryOperation(String),
}

/// Format-level information gathered while reading a CIF file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CifMetadata {
    /// The name of the data block (the text following `data_`).
    pub data_name: Option<String>,
    /// Non-fatal problems found while parsing. The structure is still returned.
    pub warnings: Vec<String>,
}

/// Reader and writer for the Crystallographic Information File format.
///
/// The reader covers the subset produced by `str2cif` and by common
/// crystallographic databases: cell parameters, one `_atom_site_` loop and an
/// optional symmetry-operation loop. Symmetry operations are applied and
/// symmetry-equivalent positions deduplicated; atom rows sharing a position
/// are merged into a single disordered site. The writer emits space group P1
/// with one row per species and explicit occupancies.
pub struct CifFile;

impl StructureFile for CifFile {
    type Metadata = CifMetadata;
    type Error = CifError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let tokens = tokenize(&content)?;
        let document = Document::parse(tokens);
        let mut metadata = CifMetadata {
            data_name: document.data_name.clone(),
            warnings: document.warnings.clone(),
        };

        let abc = ["_cell_length_a", "_cell_length_b", "_cell_length_c"]
            .map(|tag| document.number(tag));
        let angles = ["_cell_angle_alpha", "_cell_angle_beta", "_cell_angle_gamma"]
            .map(|tag| document.number(tag));
        let [a, b, c] = abc;
        let [alpha, beta, gamma] = angles;
        let abc = [a?, b?, c?];
        let angles = [alpha?, beta?, gamma?];
        let lattice = Lattice::from_parameters(abc, angles);

        let operations = document.symmetry_operations()?;
        let sites = document.sites(&operations, &mut metadata.warnings)?;

        Ok((Structure::new(lattice, sites), metadata))
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        let [a, b, c] = structure.lattice.abc();
        let [alpha, beta, gamma] = structure.lattice.angles();

        writeln!(writer, "# generated by mcsqs")?;
        writeln!(writer, "data_{}", formula(structure))?;
        writeln!(writer, "_symmetry_space_group_name_H-M   'P 1'")?;
        writeln!(writer, "_cell_length_a   {:.8}", a)?;
        writeln!(writer, "_cell_length_b   {:.8}", b)?;
        writeln!(writer, "_cell_length_c   {:.8}", c)?;
        writeln!(writer, "_cell_angle_alpha   {:.8}", alpha)?;
        writeln!(writer, "_cell_angle_beta   {:.8}", beta)?;
        writeln!(writer, "_cell_angle_gamma   {:.8}", gamma)?;
        writeln!(writer, "_cell_volume   {:.8}", structure.lattice.volume())?;
        writeln!(writer, "loop_")?;
        writeln!(writer, " _symmetry_equiv_pos_site_id")?;
        writeln!(writer, " _symmetry_equiv_pos_as_xyz")?;
        writeln!(writer, "  1  'x, y, z'")?;
        writeln!(writer, "loop_")?;
        writeln!(writer, " _atom_site_type_symbol")?;
        writeln!(writer, " _atom_site_label")?;
        writeln!(writer, " _atom_site_fract_x")?;
        writeln!(writer, " _atom_site_fract_y")?;
        writeln!(writer, " _atom_site_fract_z")?;
        writeln!(writer, " _atom_site_occupancy")?;

        let mut counters: HashMap<&str, usize> = HashMap::new();
        for site in &structure.sites {
            let f = site.frac_coords;
            for species in &site.species {
                let counter = counters.entry(species.element.as_str()).or_insert(0);
                let label = format!("{}{}", species.element, counter);
                *counter += 1;
                writeln!(
                    writer,
                    "  {}  {}  {:.8}  {:.8}  {:.8}  {}",
                    species.element, label, f.x, f.y, f.z, species.occupancy
                )?;
            }
        }
        Ok(())
    }
}

fn formula(structure: &Structure) -> String {
    structure
        .composition()
        .iter()
        .map(|(element, amount)| {
            if (amount - 1.0).abs() < OCCUPANCY_TOLERANCE {
                element.clone()
            } else if (amount - amount.round()).abs() < OCCUPANCY_TOLERANCE {
                format!("{}{}", element, amount.round() as i64)
            } else {
                format!("{}{:.3}", element, amount)
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Token {
    text: String,
    line: usize,
    quoted: bool,
}

impl Token {
    fn is_tag(&self) -> bool {
        !self.quoted && self.text.starts_with('_')
    }

    fn is_reserved(&self) -> bool {
        !self.quoted
            && (self.text.eq_ignore_ascii_case("loop_") || self.text.to_ascii_lowercase().starts_with("data_"))
    }
}

fn tokenize(content: &str) -> Result<Vec<Token>, CifError> {
    let mut tokens = Vec::new();
    let mut lines = content.lines().enumerate().peekable();

    while let Some((index, line)) = lines.next() {
        let line_num = index + 1;

        if let Some(rest) = line.strip_prefix(';') {
            let mut text = rest.to_string();
            let mut closed = false;
            for (_, next) in lines.by_ref() {
                if next.starts_with(';') {
                    closed = true;
                    break;
                }
                text.push('\n');
                text.push_str(next);
            }
            if !closed {
                return Err(CifError::Parse {
                    line: line_num,
                    message: "unterminated text field".into(),
                });
            }
            tokens.push(Token {
                text: text.trim().to_string(),
                line: line_num,
                quoted: true,
            });
            continue;
        }

        let mut chars = line.char_indices().peekable();
        while let Some(&(start, ch)) = chars.peek() {
            if ch.is_whitespace() {
                chars.next();
                continue;
            }
            if ch == '#' {
                break;
            }
            if ch == '\'' || ch == '"' {
                chars.next();
                let body_start = start + 1;
                let mut end = None;
                while let Some((pos, c)) = chars.next() {
                    let at_boundary = chars.peek().is_none_or(|&(_, n)| n.is_whitespace());
                    if c == ch && at_boundary {
                        end = Some(pos);
                        break;
                    }
                }
                let end = end.ok_or_else(|| CifError::Parse {
                    line: line_num,
                    message: "unterminated quoted string".into(),
                })?;
                tokens.push(Token {
                    text: line[body_start..end].to_string(),
                    line: line_num,
                    quoted: true,
                });
                continue;
            }
            let mut end = line.len();
            while let Some(&(pos, c)) = chars.peek() {
                if c.is_whitespace() {
                    end = pos;
                    break;
                }
                chars.next();
            }
            tokens.push(Token {
                text: line[start..end].to_string(),
                line: line_num,
                quoted: false,
            });
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone)]
struct Loop {
    tags: Vec<String>,
    rows: Vec<Vec<Token>>,
}

impl Loop {
    fn column(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|t| t == tag)
    }
}

#[derive(Debug, Default)]
struct Document {
    data_name: Option<String>,
    items: HashMap<String, Token>,
    loops: Vec<Loop>,
    warnings: Vec<String>,
}

impl Document {
    fn parse(tokens: Vec<Token>) -> Self {
        let mut document = Document::default();
        let mut tokens = tokens.into_iter().peekable();

        while let Some(token) = tokens.next() {
            if token.is_reserved() && token.text.eq_ignore_ascii_case("loop_") {
                let mut tags = Vec::new();
                while let Some(next) = tokens.next_if(Token::is_tag) {
                    tags.push(next.text.to_ascii_lowercase());
                }
                let mut values = Vec::new();
                while let Some(next) = tokens.next_if(|t| !t.is_tag() && !t.is_reserved()) {
                    values.push(next);
                }
                if tags.is_empty() {
                    document
                        .warnings
                        .push(format!("line {}: loop_ without tags ignored", token.line));
                    continue;
                }
                if values.len() % tags.len() != 0 {
                    document.warnings.push(format!(
                        "line {}: loop value count {} is not a multiple of {} tags; trailing values dropped",
                        token.line,
                        values.len(),
                        tags.len()
                    ));
                }
                let rows = values
                    .chunks_exact(tags.len())
                    .map(<[Token]>::to_vec)
                    .collect();
                document.loops.push(Loop { tags, rows });
            } else if token.is_reserved() {
                if document.data_name.is_some() {
                    document.warnings.push(format!(
                        "line {}: additional data block '{}' ignored",
                        token.line, token.text
                    ));
                    break;
                }
                document.data_name = Some(token.text[5..].to_string());
            } else if token.is_tag() {
                match tokens.next_if(|t| !t.is_tag() && !t.is_reserved()) {
                    Some(value) => {
                        document.items.insert(token.text.to_ascii_lowercase(), value);
                    }
                    None => document
                        .warnings
                        .push(format!("line {}: tag '{}' has no value", token.line, token.text)),
                }
            } else {
                document.warnings.push(format!(
                    "line {}: unexpected value '{}' ignored",
                    token.line, token.text
                ));
            }
        }
        document
    }

    fn number(&self, tag: &str) -> Result<f64, CifError> {
        let token = self
            .items
            .get(tag)
            .ok_or_else(|| CifError::MissingField(tag.to_string()))?;
        parse_number(&token.text).ok_or_else(|| CifError::Parse {
            line: token.line,
            message: format!("invalid number '{}' for {}", token.text, tag),
        })
    }

    fn find_loop(&self, tag: &str) -> Option<&Loop> {
        self.loops.iter().find(|l| l.column(tag).is_some())
    }

    fn symmetry_operations(&self) -> Result<Vec<SymmetryOperation>, CifError> {
        let candidates = [
            "_symmetry_equiv_pos_as_xyz",
            "_space_group_symop_operation_xyz",
        ];
        for tag in candidates {
            if let Some(table) = self.find_loop(tag) {
                let column = table.column(tag).unwrap_or_default();
                return table
                    .rows
                    .iter()
                    .map(|row| SymmetryOperation::parse(&row[column].text))
                    .collect();
            }
        }
        Ok(vec![SymmetryOperation::identity()])
    }

    fn sites(
        &self,
        operations: &[SymmetryOperation],
        warnings: &mut Vec<String>,
    ) -> Result<Vec<Site>, CifError> {
        let table = self
            .find_loop("_atom_site_fract_x")
            .ok_or_else(|| CifError::MissingField("_atom_site_fract_x".into()))?;

        let column = |tag: &str| {
            table
                .column(tag)
                .ok_or_else(|| CifError::MissingField(tag.to_string()))
        };
        let coordinate_columns = [
            column("_atom_site_fract_x")?,
            column("_atom_site_fract_y")?,
            column("_atom_site_fract_z")?,
        ];
        let label_column = table.column("_atom_site_label");
        let symbol_column = table.column("_atom_site_type_symbol");
        let occupancy_column = table.column("_atom_site_occupancy");
        if label_column.is_none() && symbol_column.is_none() {
            return Err(CifError::MissingField(
                "_atom_site_type_symbol or _atom_site_label".into(),
            ));
        }

        let mut sites: Vec<Site> = Vec::new();
        for row in &table.rows {
            let line = row[0].line;
            let mut coords = [0.0; 3];
            for (axis, &col) in coordinate_columns.iter().enumerate() {
                coords[axis] = parse_number(&row[col].text).ok_or_else(|| CifError::Parse {
                    line,
                    message: format!("invalid fractional coordinate '{}'", row[col].text),
                })?;
            }

            let label = label_column.map(|c| row[c].text.clone());
            let symbol_source = symbol_column
                .map(|c| row[c].text.as_str())
                .or(label.as_deref())
                .unwrap_or_default();
            let element = element_symbol(symbol_source).ok_or_else(|| CifError::Parse {
                line,
                message: format!("cannot determine element from '{}'", symbol_source),
            })?;

            let occupancy = match occupancy_column {
                Some(c) if !is_missing(&row[c].text) => {
                    parse_number(&row[c].text).ok_or_else(|| CifError::Parse {
                        line,
                        message: format!("invalid occupancy '{}'", row[c].text),
                    })?
                }
                _ => 1.0,
            };

            let position = Point3::from(coords);
            let mut orbit: Vec<Point3<f64>> = Vec::new();
            for operation in operations {
                let image = wrap(&operation.apply(&position));
                if !orbit.iter().any(|p| same_position(p, &image)) {
                    orbit.push(image);
                }
            }

            for image in orbit {
                match sites.iter_mut().find(|s| same_position(&s.frac_coords, &image)) {
                    Some(existing) => {
                        if let Some(species) =
                            existing.species.iter_mut().find(|s| s.element == element)
                        {
                            warnings.push(format!(
                                "line {}: duplicate {} at ({:.4}, {:.4}, {:.4}) merged",
                                line, element, image.x, image.y, image.z
                            ));
                            species.occupancy += occupancy;
                        } else {
                            existing.species.push(Species::new(&element, occupancy));
                            existing.species.sort_by(|a, b| a.element.cmp(&b.element));
                        }
                    }
                    None => {
                        let mut site = Site::new(vec![Species::new(&element, occupancy)], image);
                        site.label = label.clone();
                        sites.push(site);
                    }
                }
            }
        }

        for site in &mut sites {
            let total = site.total_occupancy();
            if total > 1.0 + OCCUPANCY_TOLERANCE {
                warnings.push(format!(
                    "site at ({:.4}, {:.4}, {:.4}) has total occupancy {:.6}; normalized to 1",
                    site.frac_coords.x, site.frac_coords.y, site.frac_coords.z, total
                ));
                for species in &mut site.species {
                    species.occupancy /= total;
                }
            }
        }

        if sites.is_empty() {
            return Err(CifError::MissingField("atom site rows".into()));
        }
        Ok(sites)
    }
}

fn is_missing(text: &str) -> bool {
    text == "." || text == "?"
}

/// Parses a CIF number, dropping a trailing standard uncertainty such as `(3)`.
fn parse_number(text: &str) -> Option<f64> {
    let value = text.split('(').next().unwrap_or(text);
    value.parse().ok()
}

/// Extracts an element symbol from a type symbol or label (`Fe2+` → `Fe`, `O1` → `O`).
fn element_symbol(text: &str) -> Option<String> {
    let mut letters = text.chars().take_while(|c| c.is_ascii_alphabetic());
    let first = letters.next()?.to_ascii_uppercase();
    let mut symbol = first.to_string();
    if let Some(second) = letters.next() {
        if second.is_ascii_lowercase() {
            symbol.push(second);
        }
    }
    Some(symbol)
}

fn wrap(point: &Point3<f64>) -> Point3<f64> {
    point.map(|x| {
        let wrapped = x - x.floor();
        if wrapped > 1.0 - POSITION_TOLERANCE * 1e-3 {
            0.0
        } else {
            wrapped
        }
    })
}

fn same_position(a: &Point3<f64>, b: &Point3<f64>) -> bool {
    (a - b).iter().all(|d| (d - d.round()).abs() < POSITION_TOLERANCE)
}

/// An affine symmetry operation acting on fractional coordinates.
#[derive(Debug, Clone, PartialEq)]
struct SymmetryOperation {
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl SymmetryOperation {
    fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Parses an operation written as `x,y,z`-style expressions, e.g. `-y+1/2, x, z+0.25`.
    fn parse(text: &str) -> Result<Self, CifError> {
        let invalid = || CifError::InvalidSymmetryOperation(text.to_string());
        let components: Vec<&str> = text.split(',').collect();
        if components.len() != 3 {
            return Err(invalid());
        }

        let mut rotation = Matrix3::zeros();
        let mut translation = Vector3::zeros();
        for (row, component) in components.iter().enumerate() {
            let expression: String = component
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            if expression.is_empty() {
                return Err(invalid());
            }

            let mut sign = 1.0;
            let mut number = String::new();
            let flush = |number: &mut String, sign: f64, translation: &mut f64| -> Result<(), CifError> {
                if number.is_empty() {
                    return Ok(());
                }
                let value = match number.split_once('/') {
                    Some((num, den)) => {
                        let num: f64 = num.parse().map_err(|_| invalid())?;
                        let den: f64 = den.parse().map_err(|_| invalid())?;
                        num / den
                    }
                    None => number.parse().map_err(|_| invalid())?,
                };
                *translation += sign * value;
                number.clear();
                Ok(())
            };

            for ch in expression.chars() {
                match ch {
                    '+' | '-' => {
                        flush(&mut number, sign, &mut translation[row])?;
                        sign = if ch == '-' { -1.0 } else { 1.0 };
                    }
                    'x' | 'y' | 'z' => {
                        if !number.is_empty() {
                            return Err(invalid());
                        }
                        let column = (ch as u8 - b'x') as usize;
                        rotation[(row, column)] += sign;
                        sign = 1.0;
                    }
                    '0'..='9' | '.' | '/' => number.push(ch),
                    _ => return Err(invalid()),
                }
            }
            flush(&mut number, sign, &mut translation[row])?;
        }

        Ok(Self {
            rotation,
            translation,
        })
    }

    fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * point.coords + self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const STR2CIF_OUTPUT: &str = "\
data_str2cif
_symmetry_space_group_name_H-M 'P 1'
_cell_length_a 7.200000
_cell_length_b 3.600000
_cell_length_c 3.600000
_cell_angle_alpha 90.000000
_cell_angle_beta 90.000000
_cell_angle_gamma 90.000000
loop_
_symmetry_equiv_pos_as_xyz
x,y,z
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
_atom_site_occupancy
Au1 Au 0.000000 0.000000 0.000000 1
Cu2 Cu 0.500000 0.000000 0.000000 1
Au3 Au 0.250000 0.500000 0.500000 1
Cu4 Cu 0.750000 0.500000 0.500000 1
";

    fn read(text: &str) -> (Structure, CifMetadata) {
        CifFile::read_from(&mut Cursor::new(text)).unwrap()
    }

    #[test]
    fn reads_converter_output_as_ordered_p1_structure() {
        let (structure, metadata) = read(STR2CIF_OUTPUT);
        assert_eq!(metadata.data_name.as_deref(), Some("str2cif"));
        assert!(metadata.warnings.is_empty());
        assert_eq!(structure.num_sites(), 4);
        assert!(structure.is_ordered());
        assert!((structure.lattice.abc()[0] - 7.2).abs() < 1e-9);
        assert_eq!(structure.sites[1].species[0].element, "Cu");
        assert_eq!(structure.sites[0].label.as_deref(), Some("Au1"));
    }

    #[test]
    fn symmetry_operations_expand_and_deduplicate_positions() {
        let text = "\
data_fcc
_cell_length_a 3.6
_cell_length_b 3.6
_cell_length_c 3.6
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
_space_group_symop_operation_xyz
'x, y, z'
'x+1/2, y+1/2, z'
'x+1/2, y, z+1/2'
'x, y+1/2, z+1/2'
'-x, -y, -z'
loop_
_atom_site_label
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Cu1 0 0 0
";
        let (structure, _) = read(text);
        assert_eq!(structure.num_sites(), 4);
        assert!(
            structure
                .sites
                .iter()
                .any(|s| same_position(&s.frac_coords, &Point3::new(0.5, 0.0, 0.5)))
        );
        assert_eq!(structure.sites[0].species[0].element, "Cu");
    }

    #[test]
    fn rows_sharing_a_position_become_one_disordered_site() {
        let text = "\
data_cuau
_cell_length_a 3.6
_cell_length_b 3.6
_cell_length_c 3.6
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
_atom_site_occupancy
Au1 Au 0 0 0 0.5(1)
Cu1 Cu 0 0 0 0.5
Pd1 Pd2+ 0.5 0.5 0.5 .
";
        let (structure, metadata) = read(text);
        assert!(metadata.warnings.is_empty());
        assert_eq!(structure.num_sites(), 2);
        assert!(structure.is_disordered());
        let mixed = &structure.sites[0];
        assert_eq!(mixed.species.len(), 2);
        assert_eq!(mixed.species[0].element, "Au");
        assert_eq!(structure.sites[1].species[0].element, "Pd");
        assert!(structure.sites[1].is_ordered());
    }

    #[test]
    fn over_occupied_site_is_normalized_with_a_warning() {
        let text = "\
data_x
_cell_length_a 3
_cell_length_b 3
_cell_length_c 3
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
_atom_site_occupancy
Fe 0 0 0 0.6
Ni 0 0 0 0.6
";
        let (structure, metadata) = read(text);
        assert_eq!(metadata.warnings.len(), 1);
        assert!((structure.sites[0].total_occupancy() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cell_lengths_and_angles_keep_their_order() {
        let text = "data_x\n_cell_length_a 3\n_cell_length_b 4(1)\n_cell_length_c 5\n\
                    _cell_angle_alpha 80\n_cell_angle_beta 85\n_cell_angle_gamma 95\n\
                    loop_\n_atom_site_type_symbol\n_atom_site_fract_x\n_atom_site_fract_y\n\
                    _atom_site_fract_z\nFe 0 0 0\n";
        let (structure, _) = read(text);
        let abc = structure.lattice.abc();
        let angles = structure.lattice.angles();
        for (got, want) in abc.iter().zip([3.0, 4.0, 5.0]) {
            assert!((got - want).abs() < 1e-9, "{} != {}", got, want);
        }
        for (got, want) in angles.iter().zip([80.0, 85.0, 95.0]) {
            assert!((got - want).abs() < 1e-9, "{} != {}", got, want);
        }
    }

    #[test]
    fn missing_cell_parameter_is_an_error() {
        let text = "data_x\n_cell_length_a 3\nloop_\n_atom_site_type_symbol\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\nFe 0 0 0\n";
        let result = CifFile::read_from(&mut Cursor::new(text));
        assert!(matches!(result, Err(CifError::MissingField(tag)) if tag == "_cell_length_b"));
    }

    #[test]
    fn written_p1_file_is_read_back_with_identical_occupations() {
        let lattice = Lattice::from_parameters([3.0, 4.0, 5.0], [90.0, 100.0, 90.0]);
        let structure = Structure::new(
            lattice,
            vec![
                Site::new(
                    vec![Species::new("Au", 0.25), Species::new("Cu", 0.75)],
                    Point3::new(0.1, 0.2, 0.3),
                ),
                Site::ordered("O", Point3::new(0.5, 0.5, 0.5)),
            ],
        );
        let mut buffer = Vec::new();
        CifFile::write_to(&structure, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("data_Au0.250Cu0.750O"));

        let (parsed, metadata) = read(&text);
        assert!(metadata.warnings.is_empty());
        assert_eq!(parsed.num_sites(), 2);
        assert_eq!(parsed.sites[0].species, structure.sites[0].species);
        assert!((parsed.lattice.angles()[1] - 100.0).abs() < 1e-6);
    }

    #[test]
    fn semicolon_text_fields_and_comments_are_skipped() {
        let text = format!(
            "# header comment\n_publ_section_title\n;\nA title\nspanning lines\n;\n{}",
            STR2CIF_OUTPUT
        );
        let (structure, metadata) = read(&text);
        assert_eq!(structure.num_sites(), 4);
        assert!(metadata.warnings.is_empty());
    }

    #[test]
    fn symmetry_operation_parser_handles_signs_and_fractions() {
        let op = SymmetryOperation::parse("-y+1/2, x-y, 0.25+z").unwrap();
        let image = op.apply(&Point3::new(0.1, 0.2, 0.3));
        assert!((image.x - 0.3).abs() < 1e-12);
        assert!((image.y - -0.1).abs() < 1e-12);
        assert!((image.z - 0.55).abs() < 1e-12);
        assert!(SymmetryOperation::parse("x,y").is_err());
        assert!(SymmetryOperation::parse("x,y,q").is_err());
    }

    #[test]
    fn element_symbol_strips_charges_and_label_digits() {
        assert_eq!(element_symbol("Fe2+").as_deref(), Some("Fe"));
        assert_eq!(element_symbol("O1").as_deref(), Some("O"));
        assert_eq!(element_symbol("CU").as_deref(), Some("C"));
        assert_eq!(element_symbol("1X"), None);
    }
}
