//! Reader for the line-oriented `.dat` input format
//!
//! ```text
//! <title line>
//! NUMNP NUMEG NLCASE MODEX [DIM]
//! N bx by [bz] x y [z]                 (NUMNP lines)
//! LL NL                                (per load case)
//! node dof load                        (NL lines)
//! TYPE NUME NUMMAT                     (per element group)
//! set E A | set E nu t                 (NUMMAT lines: bar | Q4)
//! N n1 n2 set | N n1 n2 n3 n4 set      (NUME lines: bar | Q4)
//! ```
//!
//! Boundary codes are 0 for a free DOF and 1 for a fixed one. `DIM` is 2 or 3
//! (default 3); in 2D the Z translation of every node is restrained. Blank
//! lines and text after `#` are ignored everywhere except in the title.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};

use crate::analysis::SolutionMode;
use crate::elements::{ElementGroup, ElementType, Material, Node, NDF};
use crate::error::{FEMError, FEMResult};
use crate::loads::LoadCase;
use crate::model::Domain;

/// One significant input line split into fields
struct Record<'a> {
    line: usize,
    fields: Vec<&'a str>,
}

impl Record<'_> {
    fn error(&self, message: impl Into<String>) -> FEMError {
        FEMError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn expect_fields(&self, count: usize, layout: &str) -> FEMResult<()> {
        if self.fields.len() != count {
            return Err(self.error(format!(
                "expected {} fields ({}), found {}",
                count,
                layout,
                self.fields.len()
            )));
        }
        Ok(())
    }

    fn parse<T: FromStr>(&self, index: usize, name: &str) -> FEMResult<T> {
        let field = self
            .fields
            .get(index)
            .ok_or_else(|| self.error(format!("missing {}", name)))?;
        field
            .parse()
            .map_err(|_| self.error(format!("invalid {} '{}'", name, field)))
    }

    /// Parse a 1-based counter that must equal `expected`
    fn sequence(&self, index: usize, name: &str, expected: usize) -> FEMResult<()> {
        let value: usize = self.parse(index, name)?;
        if value != expected {
            return Err(self.error(format!(
                "{} {} out of sequence, expected {}",
                name, value, expected
            )));
        }
        Ok(())
    }
}

/// Cursor over the significant lines of an input file
struct Records<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    last_line: usize,
}

impl<'a> Records<'a> {
    fn new(lines: std::iter::Enumerate<std::str::Lines<'a>>) -> Self {
        Self { lines, last_line: 1 }
    }

    fn next(&mut self, what: &str) -> FEMResult<Record<'a>> {
        for (i, raw) in self.lines.by_ref() {
            self.last_line = i + 1;
            let content = raw.split('#').next().unwrap_or_default();
            let fields: Vec<&str> = content.split_whitespace().collect();
            if !fields.is_empty() {
                return Ok(Record {
                    line: i + 1,
                    fields,
                });
            }
        }
        Err(FEMError::Parse {
            line: self.last_line,
            message: format!("unexpected end of input, expected {}", what),
        })
    }
}

/// Attach the line of `record` to a validation error raised by the domain
fn at_line(record: &Record<'_>, err: FEMError) -> FEMError {
    match err {
        FEMError::Parse { .. } => err,
        other => record.error(other.to_string()),
    }
}

/// Parse a domain from the text of an input file
pub fn parse_dat(input: &str) -> FEMResult<Domain> {
    let mut lines = input.lines().enumerate();
    let title = match lines.next() {
        Some((_, line)) => line.trim().to_string(),
        None => {
            return Err(FEMError::Parse {
                line: 1,
                message: "empty input".to_string(),
            })
        }
    };
    let mut records = Records::new(lines);

    // Control line
    let control = records.next("control line")?;
    if control.fields.len() != 4 && control.fields.len() != 5 {
        return Err(control.error(format!(
            "expected NUMNP NUMEG NLCASE MODEX [DIM], found {} fields",
            control.fields.len()
        )));
    }
    let numnp: usize = control.parse(0, "NUMNP")?;
    let numeg: usize = control.parse(1, "NUMEG")?;
    let nlcase: usize = control.parse(2, "NLCASE")?;
    let modex: usize = control.parse(3, "MODEX")?;
    let dimension: usize = if control.fields.len() == 5 {
        control.parse(4, "DIM")?
    } else {
        3
    };

    let mut domain = match dimension {
        2 => Domain::planar(&title),
        3 => Domain::new(&title),
        d => return Err(control.error(format!("DIM must be 2 or 3, found {}", d))),
    };
    domain.mode = SolutionMode::from_modex(modex);
    debug!(
        "Control: {} nodes, {} groups, {} load cases, MODEX {}, {}D",
        numnp, numeg, nlcase, modex, dimension
    );

    // Nodal point data
    for n in 1..=numnp {
        let record = records.next("nodal point data")?;
        let node = read_node(&record, n, dimension)?;
        domain.add_node(node).map_err(|e| at_line(&record, e))?;
    }

    // Load data
    for l in 1..=nlcase {
        let header = records.next("load case header")?;
        header.expect_fields(2, "LL NL")?;
        header.sequence(0, "load case", l)?;
        let nl: usize = header.parse(1, "NL")?;

        let mut case = LoadCase::new();
        for _ in 0..nl {
            let record = records.next("concentrated load")?;
            record.expect_fields(3, "node dof load")?;
            case = case.with_load(
                record.parse(0, "node")?,
                record.parse(1, "dof")?,
                record.parse(2, "load")?,
            );
        }
        domain.add_load_case(case).map_err(|e| at_line(&header, e))?;
    }

    // Element group data
    for g in 1..=numeg {
        let header = records.next("element group header")?;
        header.expect_fields(3, "TYPE NUME NUMMAT")?;
        let code: usize = header.parse(0, "element type")?;
        let element_type = ElementType::from_code(code)
            .ok_or_else(|| header.error(format!("unknown element type {}", code)))?;
        let nume: usize = header.parse(1, "NUME")?;
        let nummat: usize = header.parse(2, "NUMMAT")?;

        let mut group = ElementGroup::new(element_type);
        for set in 1..=nummat {
            let record = records.next("material set")?;
            group.materials.push(read_material(&record, element_type, set)?);
        }
        for e in 1..=nume {
            let record = records.next("element data")?;
            let npe = element_type.nodes_per_element();
            record.expect_fields(npe + 2, "N nodes... set")?;
            record.sequence(0, "element", e)?;
            let nodes = (1..=npe)
                .map(|i| record.parse(i, "node"))
                .collect::<FEMResult<Vec<usize>>>()?;
            group = group.with_element(&nodes, record.parse(npe + 1, "material set")?);
        }

        debug!("Read group {}: {} {} elements", g, nume, element_type.name());
        domain.add_group(group).map_err(|e| at_line(&header, e))?;
    }

    info!(
        "Read '{}': {} nodes, {} element groups, {} load cases",
        domain.title,
        domain.nodes.len(),
        domain.groups.len(),
        domain.load_cases.len()
    );
    Ok(domain)
}

fn read_node(record: &Record<'_>, number: usize, dimension: usize) -> FEMResult<Node> {
    let layout = if dimension == 2 { "N bx by x y" } else { "N bx by bz x y z" };
    record.expect_fields(1 + 2 * dimension, layout)?;
    record.sequence(0, "node", number)?;

    let mut bcode = [0usize; NDF];
    let mut xyz = [0.0; 3];
    for k in 0..dimension {
        bcode[k] = record.parse(1 + k, "boundary code")?;
        xyz[k] = record.parse(1 + dimension + k, "coordinate")?;
    }
    Ok(Node::new(number, xyz[0], xyz[1], xyz[2]).with_bcode(bcode))
}

fn read_material(record: &Record<'_>, element_type: ElementType, set: usize) -> FEMResult<Material> {
    match element_type {
        ElementType::Bar => {
            record.expect_fields(3, "set E A")?;
            record.sequence(0, "material set", set)?;
            Ok(Material::bar(record.parse(1, "E")?, record.parse(2, "area")?))
        }
        ElementType::Q4 => {
            record.expect_fields(4, "set E nu t")?;
            record.sequence(0, "material set", set)?;
            Ok(Material::plane_stress(
                record.parse(1, "E")?,
                record.parse(2, "nu")?,
                record.parse(3, "thickness")?,
            ))
        }
    }
}

impl Domain {
    /// Parse a domain from `.dat` text
    pub fn from_dat_str(input: &str) -> FEMResult<Self> {
        parse_dat(input)
    }

    /// Read a domain from a `.dat` file
    pub fn from_dat_file(path: impl AsRef<Path>) -> FEMResult<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        parse_dat(&raw)
    }
}
