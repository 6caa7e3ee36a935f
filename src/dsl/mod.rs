//! Text format for describing wire-chamber cells.
//!
//! The format is line-oriented in the style of a SPICE netlist: one
//! electrode per line, `.directives` for cell-wide settings, and `#` or
//! `;` comments. Lengths are in cm and voltages in V. Numbers take the
//! length units `um`, `mm` and `cm`, so a 20 µm wire diameter is written
//! `20um`; single-letter suffixes such as `u` or `k` are plain SI
//! multipliers (`1.5k` is 1500).
//!
//! # Grammar Overview
//!
//! ```text
//! cell       = { line }
//! line       = comment | directive | element | empty
//! element    = wire | tube | plane | strip | pixel
//! wire       = "wire" x y diameter voltage [label] { option }
//! tube       = "tube" radius voltage [edges] [label]
//! plane      = "plane" axis coord voltage [label]
//! strip      = "strip" axis coord direction smin smax [label] ["gap=" number]
//! pixel      = "pixel" axis coord smin smax zmin zmax [label] ["gap=" number]
//! directive  = ".period" axis number
//!            | ".readout" label
//!            | ".charge" x y z q
//!            | ".config" { option }
//! option     = name "=" value
//! axis       = "x" | "y"
//! number     = ['-'|'+'] digits ['.' digits] [('e'|'E') ['-'|'+'] digits] [suffix]
//! suffix     = "um" | "mm" | "cm" | 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! ```
//!
//! Wire options are `length`, `tension`, `rho` and `ntrap`; `.config`
//! accepts `nbessel`, `npoly`, `nfourier` and `check`.
//!
//! # Example
//!
//! ```text
//! # MWPC cell: anode between two cathode planes
//! wire  0    0 20um  1500 anode
//! wire  0.25 0 100um    0 field
//! plane y -0.5 0 cathode
//! plane y  0.5 0 cathode
//! .period x 0.5
//! .readout anode
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse a cell description into an AST.
pub fn parse(input: &str) -> Result<CellAst> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse a cell description file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<CellAst> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::FieldError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_build_field_from_text() {
        let input = "\
wire 0 0 20um 1500 anode
wire 0.25 0 100um 0 field
plane y -0.5 0 cathode
plane y 0.5 0 cathode
.period x 0.5
.readout anode
.config nbessel=8
";
        let mut field = parse(input).unwrap().build().unwrap();
        assert_eq!(field.number_of_wires(), 2);
        assert_eq!(field.number_of_planes_y(), 2);
        assert_eq!(field.periodicity_x(), Some(0.5));
        assert_eq!(field.config().n_term_bessel, 8);

        let (status, value) = field.electric_field_potential(0.1, 0.2, 0.0);
        assert_eq!(status, 0);
        assert!(value.v > 0.0 && value.v < 1500.0);
        assert_relative_eq!(field.wire(0).unwrap().diameter, 20e-4);
        assert_relative_eq!(field.weighting_potential(10e-4 * (1.0 + 1e-6), 0.0, 0.0, "anode"), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_build_reports_invalid_geometry() {
        let ast = parse("wire 0 0 -1m 100\n").unwrap();
        assert!(ast.build().is_err());
    }
}
