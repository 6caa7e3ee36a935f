//! Parser for the cell description language.

use super::ast::*;
use super::lexer::{parse_value, Lexer, Token, TokenKind};
use crate::cell::Axis;
use crate::error::{FieldError, Result};

/// Recursive-descent parser over one token of lookahead.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a parser; the first token is read eagerly.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the whole description.
    pub fn parse(&mut self) -> Result<CellAst> {
        let mut ast = CellAst::new();

        loop {
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Directive => self.parse_directive(&mut ast)?,
                TokenKind::Identifier => {
                    let element = self.parse_element()?;
                    ast.elements.push(element);
                }
                _ => {
                    return Err(FieldError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }
            self.end_of_line()?;
        }

        Ok(ast)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn at_line_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Newline | TokenKind::Eof)
    }

    fn end_of_line(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Eof => Ok(()),
            TokenKind::Newline => self.advance(),
            _ => Err(FieldError::parse(
                self.current.line,
                format!("unexpected trailing token: {:?}", self.current.text),
            )),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.current.kind != kind {
            return Err(FieldError::parse(
                self.current.line,
                format!("expected {what}, got {:?}", self.current.text),
            ));
        }
        let tok = self.current.clone();
        self.advance()?;
        Ok(tok)
    }

    fn number(&mut self, what: &str) -> Result<f64> {
        let tok = self.expect(TokenKind::Number, what)?;
        parse_value(&tok.text).ok_or_else(|| FieldError::parse(tok.line, format!("invalid number: {}", tok.text)))
    }

    fn axis(&mut self) -> Result<Axis> {
        let tok = self.expect(TokenKind::Identifier, "axis x or y")?;
        match tok.text.to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            other => Err(FieldError::parse(tok.line, format!("expected axis x or y, got '{other}'"))),
        }
    }

    /// A label, if the next token is a bare word rather than `key=value`.
    fn label(&mut self) -> Result<String> {
        if self.current.kind != TokenKind::Identifier {
            return Ok(String::new());
        }
        let tok = self.current.clone();
        self.advance()?;
        if self.current.kind == TokenKind::Equals {
            return Err(FieldError::parse(
                tok.line,
                format!("option '{}' given before the label", tok.text),
            ));
        }
        Ok(tok.text)
    }

    /// `key=value` pairs up to the end of the line.
    fn options(&mut self, allowed: &[&str]) -> Result<Vec<(String, Token)>> {
        let mut out = Vec::new();
        while !self.at_line_end() {
            let key = self.expect(TokenKind::Identifier, "option name")?;
            let name = key.text.to_ascii_lowercase();
            if !allowed.contains(&name.as_str()) {
                return Err(FieldError::parse(key.line, format!("unknown option '{}'", key.text)));
            }
            self.expect(TokenKind::Equals, "'='")?;
            let value = self.current.clone();
            if !matches!(value.kind, TokenKind::Number | TokenKind::Identifier) {
                return Err(FieldError::parse(value.line, format!("missing value for '{name}'")));
            }
            self.advance()?;
            out.push((name, value));
        }
        Ok(out)
    }

    fn parse_directive(&mut self, ast: &mut CellAst) -> Result<()> {
        let directive = self.current.text.to_ascii_lowercase();
        let line = self.current.line;
        self.advance()?;

        match directive.as_str() {
            ".period" => {
                let axis = self.axis()?;
                let period = self.number("period")?;
                ast.periods.push(PeriodDef { axis, period, line });
            }
            ".readout" => {
                let label = self.expect(TokenKind::Identifier, "readout label")?;
                if !ast.readouts.contains(&label.text) {
                    ast.readouts.push(label.text);
                }
            }
            ".charge" => {
                let x = self.number("x")?;
                let y = self.number("y")?;
                let z = self.number("z")?;
                let q = self.number("charge")?;
                ast.charges.push(ChargeDef { x, y, z, q });
            }
            ".config" => {
                for (key, value) in self.options(&["nbessel", "npoly", "nfourier", "check"])? {
                    match key.as_str() {
                        "nbessel" => ast.config.n_term_bessel = Some(count(&value)? as usize),
                        "npoly" => ast.config.n_term_poly = Some(count(&value)? as usize),
                        "nfourier" => ast.config.n_fourier = Some(count(&value)? as usize),
                        _ => ast.config.charge_check = Some(flag(&value)?),
                    }
                }
            }
            _ => {
                return Err(FieldError::parse(line, format!("unknown directive: {directive}")));
            }
        }
        Ok(())
    }

    fn parse_element(&mut self) -> Result<ElementDef> {
        let keyword = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        let (kind, label) = match keyword.to_ascii_lowercase().as_str() {
            "wire" => self.parse_wire()?,
            "tube" => {
                let radius = self.number("tube radius")?;
                let voltage = self.number("tube voltage")?;
                let edges = if self.current.kind == TokenKind::Number {
                    let tok = self.current.clone();
                    self.advance()?;
                    integer(&tok)?
                } else {
                    0
                };
                let label = self.label()?;
                let edges = i32::try_from(edges)
                    .map_err(|_| FieldError::parse(line, format!("edge count {edges} out of range")))?;
                (ElementKind::Tube { radius, voltage, edges }, label)
            }
            "plane" => {
                let axis = self.axis()?;
                let coord = self.number("plane coordinate")?;
                let voltage = self.number("plane voltage")?;
                (ElementKind::Plane { axis, coord, voltage }, self.label()?)
            }
            "strip" => {
                let axis = self.axis()?;
                let coord = self.number("plane coordinate")?;
                let dir = self.expect(TokenKind::Identifier, "strip direction")?;
                let mut letters = dir.text.chars();
                let direction = match (letters.next(), letters.next()) {
                    (Some(c), None) => c.to_ascii_lowercase(),
                    _ => {
                        return Err(FieldError::parse(
                            dir.line,
                            format!("invalid strip direction '{}'", dir.text),
                        ))
                    }
                };
                let smin = self.number("strip lower edge")?;
                let smax = self.number("strip upper edge")?;
                let label = self.label()?;
                let gap = self.gap()?;
                (
                    ElementKind::Strip {
                        axis,
                        coord,
                        direction,
                        smin,
                        smax,
                        gap,
                    },
                    label,
                )
            }
            "pixel" => {
                let axis = self.axis()?;
                let coord = self.number("plane coordinate")?;
                let smin = self.number("pixel lower edge")?;
                let smax = self.number("pixel upper edge")?;
                let zmin = self.number("pixel lower z")?;
                let zmax = self.number("pixel upper z")?;
                let label = self.label()?;
                let gap = self.gap()?;
                (
                    ElementKind::Pixel {
                        axis,
                        coord,
                        smin,
                        smax,
                        zmin,
                        zmax,
                        gap,
                    },
                    label,
                )
            }
            _ => return Err(FieldError::UnknownElement { keyword, line }),
        };

        Ok(ElementDef { kind, label, line })
    }

    fn parse_wire(&mut self) -> Result<(ElementKind, String)> {
        let x = self.number("wire x")?;
        let y = self.number("wire y")?;
        let diameter = self.number("wire diameter")?;
        let voltage = self.number("wire voltage")?;
        let label = self.label()?;

        let (mut length, mut tension, mut density, mut n_trap) = (None, None, None, None);
        for (key, value) in self.options(&["length", "tension", "rho", "ntrap"])? {
            match key.as_str() {
                "length" => length = Some(real(&value)?),
                "tension" => tension = Some(real(&value)?),
                "rho" => density = Some(real(&value)?),
                _ => n_trap = Some(count(&value)?),
            }
        }
        let kind = ElementKind::Wire {
            x,
            y,
            diameter,
            voltage,
            length,
            tension,
            density,
            n_trap,
        };
        Ok((kind, label))
    }

    /// Optional `gap=` option; zero means derive it from the cell.
    fn gap(&mut self) -> Result<f64> {
        let mut gap = 0.0;
        for (_, value) in self.options(&["gap"])? {
            gap = real(&value)?;
        }
        Ok(gap)
    }
}

fn real(tok: &Token) -> Result<f64> {
    parse_value(&tok.text).ok_or_else(|| FieldError::parse(tok.line, format!("invalid number: {}", tok.text)))
}

fn integer(tok: &Token) -> Result<i64> {
    let v = real(tok)?;
    if v.fract() != 0.0 || v.abs() > i32::MAX as f64 {
        return Err(FieldError::parse(tok.line, format!("expected an integer, got {}", tok.text)));
    }
    Ok(v as i64)
}

fn count(tok: &Token) -> Result<u32> {
    let v = integer(tok)?;
    u32::try_from(v).map_err(|_| FieldError::parse(tok.line, format!("expected a non-negative count, got {}", tok.text)))
}

fn flag(tok: &Token) -> Result<bool> {
    match tok.text.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(FieldError::parse(tok.line, format!("expected on/off, got {}", tok.text))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_wire_with_options() {
        let ast = parse("wire 0 0.5 20u 1.5k anode tension=80 ntrap=3\n").unwrap();
        assert_eq!(ast.elements.len(), 1);
        let e = &ast.elements[0];
        assert_eq!(e.label, "anode");
        assert_eq!(e.line, 1);
        match e.kind {
            ElementKind::Wire {
                y,
                diameter,
                voltage,
                tension,
                n_trap,
                length,
                ..
            } => {
                assert_relative_eq!(y, 0.5);
                assert_relative_eq!(diameter, 20e-6);
                assert_relative_eq!(voltage, 1500.0);
                assert_eq!(tension, Some(80.0));
                assert_eq!(n_trap, Some(3));
                assert_eq!(length, None);
            }
            _ => panic!("expected a wire"),
        }
    }

    #[test]
    fn test_parse_planes_strips_and_directives() {
        let input = "\
# drift cell
plane y -0.5 0 cathode
plane y 0.5 0
strip y -0.5 z -0.1 0.1 pad gap=0.2
pixel y 0.5 -0.1 0.1 -0.2 0.2 px
tube 1 -100 6 wall
.period x 0.25
.readout pad
.readout pad
.charge 0 0 0 -1.6e-4
.config nbessel=12 nfourier=8 check=on
";
        let ast = parse(input).unwrap();
        assert_eq!(ast.elements.len(), 5);
        assert_eq!(ast.elements[1].label, "");
        assert!(matches!(
            ast.elements[2].kind,
            ElementKind::Strip { axis: Axis::Y, direction: 'z', gap, .. } if gap == 0.2
        ));
        assert!(matches!(ast.elements[4].kind, ElementKind::Tube { edges: 6, .. }));
        assert_eq!(ast.periods[0].axis, Axis::X);
        assert_eq!(ast.readouts, vec!["pad".to_string()]);
        assert_eq!(ast.charges.len(), 1);
        assert_eq!(ast.config.n_term_bessel, Some(12));
        assert_eq!(ast.config.n_fourier, Some(8));
        assert_eq!(ast.config.charge_check, Some(true));
        assert_eq!(ast.config.n_term_poly, None);
    }

    #[test]
    fn test_unknown_element() {
        let err = parse("plane x 0 0\ncoil 1 2\n").unwrap_err();
        assert!(matches!(err, FieldError::UnknownElement { ref keyword, line: 2 } if keyword == "coil"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("plane z 0 0"), Err(FieldError::ParseError { .. })));
        assert!(matches!(parse("wire 0 0 1m"), Err(FieldError::ParseError { .. })));
        assert!(matches!(parse("wire 0 0 1m 0 s colour=2"), Err(FieldError::ParseError { .. })));
        assert!(matches!(parse(".config npoly=2.5"), Err(FieldError::ParseError { .. })));
        assert!(matches!(parse(".mirror x"), Err(FieldError::ParseError { .. })));
        assert!(matches!(parse("plane x 0 0 a b"), Err(FieldError::ParseError { .. })));
    }
}
