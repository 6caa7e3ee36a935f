//! Mapping of a checked cell onto one of the analytic topologies.

use log::warn;

use super::check::CheckedCell;
use super::types::{CellType, PlaneSlot};
use crate::error::{FieldError, Result};

/// Select the topology of a checked cell.
///
/// Where two parallel planes close the cell without explicit periodicity,
/// their separation becomes the cell period. Unsupported polygon edge
/// counts fall back to a circular tube.
pub fn classify(cell: &mut CheckedCell) -> Result<CellType> {
    let x0 = cell.has_plane(PlaneSlot::XLow);
    let x1 = cell.has_plane(PlaneSlot::XHigh);
    let y0 = cell.has_plane(PlaneSlot::YLow);
    let y1 = cell.has_plane(PlaneSlot::YHigh);
    let (perx, pery) = (cell.perx, cell.pery);
    let has_x = x0 || x1;
    let has_y = y0 || y1;
    let span_x = (cell.coord(PlaneSlot::XHigh) - cell.coord(PlaneSlot::XLow)).abs();
    let span_y = (cell.coord(PlaneSlot::YHigh) - cell.coord(PlaneSlot::YLow)).abs();

    if let Some(tube) = cell.tube.as_mut() {
        if perx {
            return Err(FieldError::unsupported("x periodicity inside a tube"));
        }
        return Ok(match tube.n_edges {
            0 if pery => CellType::D2,
            0 => CellType::D1,
            3..=8 if pery => CellType::D4,
            3..=8 => CellType::D3,
            n => {
                warn!(
                    "CellType: potentials for a tube with {} edges are not available; using a round tube instead",
                    n
                );
                tube.n_edges = 0;
                if pery {
                    CellType::D2
                } else {
                    CellType::D1
                }
            }
        });
    }

    if !perx && !pery && !(x0 && x1) && !(y0 && y1) {
        return Ok(CellType::A);
    }
    if perx && !pery && !has_x && !(y0 && y1) {
        return Ok(CellType::B1X);
    }
    if pery && !perx && !has_y && !(x0 && x1) {
        return Ok(CellType::B1Y);
    }
    if perx && !pery && !(y0 && y1) {
        return Ok(CellType::B2X);
    }
    if !perx && !pery && !(y0 && y1) && x0 && x1 {
        cell.sx = span_x;
        return Ok(CellType::B2X);
    }
    if pery && !perx && !(x0 && x1) {
        return Ok(CellType::B2Y);
    }
    if !perx && !pery && !(x0 && x1) && y0 && y1 {
        cell.sy = span_y;
        return Ok(CellType::B2Y);
    }
    if !has_x && !has_y && perx && pery {
        return Ok(CellType::C1);
    }
    // A lone plane sits in the low slot; one left in the high slot falls
    // through to C3.
    if !((y0 && pery) || (y0 && y1)) {
        if x0 && x1 {
            cell.sx = span_x;
            return Ok(CellType::C2X);
        }
        if perx && x0 {
            return Ok(CellType::C2X);
        }
    }
    if !((x0 && perx) || (x0 && x1)) {
        if y0 && y1 {
            cell.sy = span_y;
            return Ok(CellType::C2Y);
        }
        if pery && y0 {
            return Ok(CellType::C2Y);
        }
    }
    if perx && pery {
        return Ok(CellType::C3);
    }
    if perx && y0 && y1 {
        cell.sy = span_y;
        return Ok(CellType::C3);
    }
    if pery && x0 && x1 {
        cell.sx = span_x;
        return Ok(CellType::C3);
    }
    if x0 && x1 && y0 && y1 {
        cell.sx = span_x;
        cell.sy = span_y;
        return Ok(CellType::C3);
    }

    Err(FieldError::unsupported(format!(
        "no potential for periodicity (x: {perx}, y: {pery}) with planes {:?}",
        [x0, x1, y0, y1]
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{check_cell, Axis, Cell, Wire};

    fn classify_cell(cell: &Cell) -> (CellType, CheckedCell) {
        let mut checked = check_cell(cell).unwrap();
        let kind = classify(&mut checked).unwrap();
        (kind, checked)
    }

    fn wire_cell() -> Cell {
        let mut cell = Cell::new();
        cell.add_wire(Wire::new(0.0, 0.0, 0.002, 1000.0, "s")).unwrap();
        cell
    }

    #[test]
    fn test_free_wire_with_plane_is_a() {
        let mut cell = wire_cell();
        cell.add_plane(Axis::Y, -1.0, 0.0, "p").unwrap();
        assert_eq!(classify_cell(&cell).0, CellType::A);
    }

    #[test]
    fn test_row_topologies() {
        let mut cell = wire_cell();
        cell.add_wire(Wire::new(0.0, 0.5, 0.002, 0.0, "f")).unwrap();
        cell.set_periodicity(Axis::X, 1.0).unwrap();
        assert_eq!(classify_cell(&cell).0, CellType::B1X);

        cell.add_plane(Axis::X, -0.3, 0.0, "p").unwrap();
        assert_eq!(classify_cell(&cell).0, CellType::B2X);
    }

    #[test]
    fn test_two_planes_define_period() {
        let mut cell = wire_cell();
        cell.add_plane(Axis::X, -0.5, 0.0, "a").unwrap();
        cell.add_plane(Axis::X, 1.5, 0.0, "b").unwrap();
        let (kind, checked) = classify_cell(&cell);
        assert_eq!(kind, CellType::B2X);
        assert_eq!(checked.sx, 2.0);
    }

    #[test]
    fn test_doubly_periodic_topologies() {
        let mut cell = wire_cell();
        cell.add_wire(Wire::new(0.25, 0.25, 0.002, 0.0, "f")).unwrap();
        cell.set_periodicity(Axis::X, 1.0).unwrap();
        cell.set_periodicity(Axis::Y, 1.0).unwrap();
        assert_eq!(classify_cell(&cell).0, CellType::C1);

        let mut with_x = cell.clone();
        with_x.add_plane(Axis::X, -0.4, 0.0, "p").unwrap();
        assert_eq!(classify_cell(&with_x).0, CellType::C2X);

        let mut with_y = cell.clone();
        with_y.add_plane(Axis::Y, 0.45, 0.0, "p").unwrap();
        assert_eq!(classify_cell(&with_y).0, CellType::C2Y);

        with_x.add_plane(Axis::Y, -0.4, 0.0, "q").unwrap();
        assert_eq!(classify_cell(&with_x).0, CellType::C3);
    }

    #[test]
    fn test_lone_plane_in_high_slot_is_c3() {
        let mut cell = wire_cell();
        cell.add_wire(Wire::new(0.25, 0.25, 0.002, 0.0, "f")).unwrap();
        cell.set_periodicity(Axis::X, 1.0).unwrap();
        cell.set_periodicity(Axis::Y, 1.0).unwrap();
        cell.add_plane(Axis::Y, 0.45, 0.0, "p").unwrap();

        let mut checked = check_cell(&cell).unwrap();
        assert!(checked.has_plane(PlaneSlot::YLow));
        checked.planes.swap(PlaneSlot::YLow.index(), PlaneSlot::YHigh.index());
        assert_eq!(classify(&mut checked).unwrap(), CellType::C3);

        let mut cell = wire_cell();
        cell.add_wire(Wire::new(0.25, 0.25, 0.002, 0.0, "f")).unwrap();
        cell.set_periodicity(Axis::X, 1.0).unwrap();
        cell.set_periodicity(Axis::Y, 1.0).unwrap();
        cell.add_plane(Axis::X, -0.4, 0.0, "p").unwrap();
        let mut checked = check_cell(&cell).unwrap();
        checked.planes.swap(PlaneSlot::XLow.index(), PlaneSlot::XHigh.index());
        assert_eq!(classify(&mut checked).unwrap(), CellType::C3);
    }

    #[test]
    fn test_closed_box_is_c3() {
        let mut cell = wire_cell();
        cell.add_plane(Axis::X, -1.0, 0.0, "a").unwrap();
        cell.add_plane(Axis::X, 1.0, 0.0, "b").unwrap();
        cell.add_plane(Axis::Y, -2.0, 0.0, "c").unwrap();
        cell.add_plane(Axis::Y, 2.0, 0.0, "d").unwrap();
        let (kind, checked) = classify_cell(&cell);
        assert_eq!(kind, CellType::C3);
        assert_eq!((checked.sx, checked.sy), (2.0, 4.0));
    }

    #[test]
    fn test_tube_topologies() {
        let mut cell = wire_cell();
        cell.add_tube(1.0, 0.0, 0, "t").unwrap();
        assert_eq!(classify_cell(&cell).0, CellType::D1);
        cell.add_tube(1.0, 0.0, 6, "t").unwrap();
        assert_eq!(classify_cell(&cell).0, CellType::D3);
        cell.add_tube(1.0, 0.0, 12, "t").unwrap();
        let (kind, checked) = classify_cell(&cell);
        assert_eq!(kind, CellType::D1);
        assert_eq!(checked.tube.unwrap().n_edges, 0);
    }
}
