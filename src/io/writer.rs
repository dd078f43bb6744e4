//! Plain-text analysis report

use std::io::Write;

use crate::analysis::SolutionMode;
use crate::elements::{ElementType, Material};
use crate::error::FEMResult;
use crate::model::Domain;
use crate::results::{AnalysisResults, ElementStress, LoadCaseResult};

/// Writes the input echo and the solution of a domain as a text report
pub struct ReportWriter<W: Write> {
    out: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write the complete report: input echo, equation numbers, results
    /// of every load case and the time log
    pub fn write_report(&mut self, domain: &Domain, results: &AnalysisResults) -> FEMResult<()> {
        self.write_control(domain)?;
        self.write_nodes(domain)?;
        self.write_equation_numbers(domain)?;
        self.write_groups(domain)?;
        self.write_load_cases(domain)?;

        if domain.mode == SolutionMode::DataCheck || results.load_cases.is_empty() {
            writeln!(self.out, " Data check completed !")?;
            writeln!(self.out)?;
            return Ok(());
        }

        for case in &results.load_cases {
            self.write_load_case_result(domain, case)?;
        }
        self.write_times(results)
    }

    /// Control information block
    pub fn write_control(&mut self, domain: &Domain) -> FEMResult<()> {
        writeln!(self.out, "{}", domain.title)?;
        writeln!(self.out)?;
        writeln!(self.out, " C O N T R O L   I N F O R M A T I O N")?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "     NUMBER OF NODAL POINTS . . . . . . . . . . (NUMNP)  = {:>6}",
            domain.nodes.len()
        )?;
        writeln!(
            self.out,
            "     NUMBER OF ELEMENT GROUPS . . . . . . . . . (NUMEG)  = {:>6}",
            domain.groups.len()
        )?;
        writeln!(
            self.out,
            "     NUMBER OF LOAD CASES . . . . . . . . . . . (NLCASE) = {:>6}",
            domain.load_cases.len()
        )?;
        writeln!(
            self.out,
            "     SOLUTION MODE  . . . . . . . . . . . . . . (MODEX)  = {:>6}",
            domain.mode.modex()
        )?;
        writeln!(self.out, "        EQ.0, DATA CHECK")?;
        writeln!(self.out, "        EQ.1, EXECUTION")?;
        writeln!(self.out)?;
        Ok(())
    }

    /// Nodal point data with boundary condition codes (1 = fixed)
    pub fn write_nodes(&mut self, domain: &Domain) -> FEMResult<()> {
        let dim = domain.dimension.clamp(2, 3);
        writeln!(self.out, " N O D A L   P O I N T   D A T A")?;
        writeln!(self.out)?;
        writeln!(self.out, "    NODE       BOUNDARY                         NODAL POINT")?;
        writeln!(self.out, "   NUMBER  CONDITION  CODES                     COORDINATES")?;

        for node in &domain.nodes {
            // after numbering the codes are equation numbers, 0 = restrained
            let codes: Vec<usize> = node
                .bcode
                .iter()
                .map(|&b| {
                    if domain.is_numbered() {
                        usize::from(b == 0)
                    } else {
                        b
                    }
                })
                .collect();

            write!(self.out, "{:>9}", node.number)?;
            for code in &codes[..dim] {
                write!(self.out, "{:>5}", code)?;
            }
            write!(self.out, "    ")?;
            for x in &node.xyz[..dim] {
                write!(self.out, "{:>15.6e}", x)?;
            }
            writeln!(self.out)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// Equation numbers; skipped until the domain has been numbered
    pub fn write_equation_numbers(&mut self, domain: &Domain) -> FEMResult<()> {
        let Some(neq) = domain.neq() else {
            return Ok(());
        };
        writeln!(self.out, " E Q U A T I O N   N U M B E R S")?;
        writeln!(self.out)?;
        writeln!(self.out, "   TOTAL NUMBER OF EQUATIONS = {}", neq)?;
        writeln!(self.out)?;
        writeln!(self.out, "   NODE NUMBER   DEGREES OF FREEDOM")?;
        writeln!(self.out, "                  X    Y    Z")?;
        for node in &domain.nodes {
            writeln!(
                self.out,
                "{:>9}       {:>5}{:>5}{:>5}",
                node.number, node.bcode[0], node.bcode[1], node.bcode[2]
            )?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// Element group data: materials and connectivity
    pub fn write_groups(&mut self, domain: &Domain) -> FEMResult<()> {
        writeln!(self.out, " E L E M E N T   G R O U P   D A T A")?;
        writeln!(self.out)?;

        for (g, group) in domain.groups.iter().enumerate() {
            writeln!(self.out, " E L E M E N T   D E F I N I T I O N   ( G R O U P {:>3} )", g + 1)?;
            writeln!(self.out)?;
            writeln!(
                self.out,
                " ELEMENT TYPE  . . . . . . . . . . . . .( NPAR(1) ) . . = {:>5}",
                group.element_type.code()
            )?;
            writeln!(self.out, "     EQ.1, TRUSS ELEMENTS")?;
            writeln!(self.out, "     EQ.2, Q4 ELEMENTS")?;
            writeln!(
                self.out,
                " NUMBER OF ELEMENTS. . . . . . . . . . .( NPAR(2) ) . . = {:>5}",
                group.len()
            )?;
            writeln!(self.out)?;

            writeln!(self.out, " M A T E R I A L   D E F I N I T I O N")?;
            writeln!(self.out)?;
            writeln!(self.out, " NUMBER OF DIFFERENT SETS OF MATERIAL")?;
            writeln!(
                self.out,
                " AND CROSS-SECTIONAL  CONSTANTS  . . . .( NPAR(3) ) . . = {:>5}",
                group.materials.len()
            )?;
            writeln!(self.out)?;
            match group.element_type {
                ElementType::Bar => writeln!(self.out, "  SET       YOUNG'S     CROSS-SECTIONAL")?,
                ElementType::Q4 => writeln!(self.out, "  SET       YOUNG'S     POISSON'S      THICKNESS")?,
            }
            for (s, material) in group.materials.iter().enumerate() {
                match material {
                    Material::Bar(m) => {
                        writeln!(self.out, "{:>5}{:>16.6e}{:>16.6e}", s + 1, m.e, m.area)?
                    }
                    Material::PlaneStress(m) => writeln!(
                        self.out,
                        "{:>5}{:>16.6e}{:>16.6e}{:>16.6e}",
                        s + 1,
                        m.e,
                        m.nu,
                        m.t
                    )?,
                }
            }
            writeln!(self.out)?;

            writeln!(self.out, " E L E M E N T   I N F O R M A T I O N")?;
            writeln!(self.out, " ELEMENT     NODES                         MATERIAL")?;
            for (e, element) in group.elements.iter().enumerate() {
                write!(self.out, "{:>7}  ", e + 1)?;
                for n in &element.nodes {
                    write!(self.out, "{:>6}", n)?;
                }
                writeln!(self.out, "{:>10}", element.material)?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Concentrated loads of every load case
    pub fn write_load_cases(&mut self, domain: &Domain) -> FEMResult<()> {
        writeln!(self.out, " L O A D   C A S E   D A T A")?;
        writeln!(self.out)?;
        for (l, case) in domain.load_cases.iter().enumerate() {
            writeln!(self.out, "     LOAD CASE NUMBER . . . . . . . = {:>5}", l + 1)?;
            writeln!(self.out, "     NUMBER OF CONCENTRATED LOADS . = {:>5}", case.len())?;
            writeln!(self.out)?;
            writeln!(self.out, "    NODE       DIRECTION      LOAD")?;
            writeln!(self.out, "   NUMBER                   MAGNITUDE")?;
            for load in &case.loads {
                writeln!(self.out, "{:>7}{:>13}{:>19.6e}", load.node, load.dof, load.load)?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Displacements and element stresses of one load case
    pub fn write_load_case_result(&mut self, domain: &Domain, result: &LoadCaseResult) -> FEMResult<()> {
        let dim = domain.dimension.clamp(2, 3);
        writeln!(self.out, " LOAD CASE{:>5}", result.case)?;
        writeln!(self.out)?;
        writeln!(self.out)?;
        writeln!(self.out, " D I S P L A C E M E N T S")?;
        match dim {
            2 => writeln!(self.out, "  NODE           X-DISPLACEMENT    Y-DISPLACEMENT")?,
            _ => writeln!(
                self.out,
                "  NODE           X-DISPLACEMENT    Y-DISPLACEMENT    Z-DISPLACEMENT"
            )?,
        }
        for d in &result.displacements {
            write!(self.out, "{:>5}        ", d.node)?;
            for u in &d.displacement[..dim] {
                write!(self.out, "{:>18.6e}", u)?;
            }
            writeln!(self.out)?;
        }
        writeln!(self.out)?;

        let mut current_group = 0;
        for s in &result.stresses {
            if s.group != current_group {
                current_group = s.group;
                writeln!(
                    self.out,
                    " S T R E S S   C A L C U L A T I O N S   F O R   E L E M E N T   G R O U P{:>5}",
                    s.group
                )?;
                writeln!(self.out)?;
                match s.stress {
                    ElementStress::Axial { .. } => {
                        writeln!(self.out, "  ELEMENT             FORCE            STRESS")?
                    }
                    ElementStress::PlaneStress(_) => writeln!(
                        self.out,
                        "  ELEMENT          SIGMA_XX          SIGMA_YY          TAU_XY         VON MISES"
                    )?,
                }
            }
            match s.stress {
                ElementStress::Axial { stress, force } => {
                    writeln!(self.out, "{:>9}{:>18.6e}{:>18.6e}", s.element, force, stress)?
                }
                ElementStress::PlaneStress(p) => writeln!(
                    self.out,
                    "{:>9}{:>18.6e}{:>18.6e}{:>18.6e}{:>18.6e}",
                    s.element,
                    p.sx,
                    p.sy,
                    p.txy,
                    p.von_mises()
                )?,
            }
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// Solution time log
    pub fn write_times(&mut self, results: &AnalysisResults) -> FEMResult<()> {
        let t = &results.times;
        writeln!(self.out, " S O L U T I O N   T I M E   L O G   I N   S E C")?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "     TIME FOR CALCULATION OF STIFFNESS MATRIX  . . . . = {:.6}",
            t.assembly
        )?;
        writeln!(
            self.out,
            "     TIME FOR FACTORIZATION OF STIFFNESS MATRIX  . . . = {:.6}",
            t.factorization
        )?;
        writeln!(
            self.out,
            "     TIME FOR LOAD CASE SOLUTIONS  . . . . . . . . . . = {:.6}",
            t.solution
        )?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "     T O T A L   S O L U T I O N   T I M E  . . . . . = {:.6}",
            t.total()
        )?;
        Ok(())
    }
}
