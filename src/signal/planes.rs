//! Induced charges for plane and tube readout, and strip gaps.
//!
//! To read out a plane, the plane is raised to 1 V while every other
//! conductor stays grounded. Expressed in the Green's functions (which hold
//! every conductor at zero) this is a linear weighting potential across the
//! cell plus wire charges that cancel it on the wire surfaces.

use log::error;

use crate::cell::{Axis, CheckedCell, PlaneSlot};
use crate::error::{FieldError, Result};

use super::matrix::SignalLayer;

/// Gradient of the weighting potential of one plane.
///
/// The weighting potential is `1 - slope·(u - coord)`, where `u` is the
/// coordinate along the plane's axis.
pub fn weighting_slope(cell: &CheckedCell, slot: PlaneSlot) -> f64 {
    let partner = slot.partner();
    let periodic = match slot.axis() {
        Axis::X => cell.perx,
        Axis::Y => cell.pery,
    };
    let period = match slot.axis() {
        Axis::X => cell.sx,
        Axis::Y => cell.sy,
    };
    if cell.has_plane(partner) {
        1.0 / (cell.coord(partner) - cell.coord(slot))
    } else if periodic {
        if slot.is_low() {
            1.0 / period
        } else {
            -1.0 / period
        }
    } else {
        0.0
    }
}

/// Weighting potential of a plane seen at a wire, relative to 1 V.
fn wire_offset(cell: &CheckedCell, slot: PlaneSlot, x: f64, y: f64) -> f64 {
    let u = match slot.axis() {
        Axis::X => x,
        Axis::Y => y,
    };
    let c = cell.coord(slot);
    let periodic = match slot.axis() {
        Axis::X => cell.perx,
        Axis::Y => cell.pery,
    };
    let period = match slot.axis() {
        Axis::X => cell.sx,
        Axis::Y => cell.sy,
    };
    if cell.has_plane(slot.partner()) {
        let other = cell.coord(slot.partner());
        -(other - u) / (other - c)
    } else if periodic {
        if slot.is_low() {
            -(c + period - u) / period
        } else {
            -(u - c + period) / period
        }
    } else {
        -1.0
    }
}

/// Charges the wires of every copy carry when `offsets` is applied to the
/// wires of every copy.
///
/// Since all copies carry the same charges, the layer blocks add up to the
/// inverse of the summed potential matrix.
fn periodic_response(layers: &[SignalLayer], offsets: &[f64]) -> Vec<f64> {
    let n = offsets.len();
    (0..n)
        .map(|j| {
            layers
                .iter()
                .map(|layer| {
                    offsets
                        .iter()
                        .enumerate()
                        .map(|(i, v)| layer.inverse.get(j, i).re * v)
                        .sum::<f64>()
                })
                .sum()
        })
        .collect()
}

/// Wire charges for reading out a rectilinear plane.
pub fn plane_charges(cell: &CheckedCell, layers: &[SignalLayer], slot: PlaneSlot) -> Vec<f64> {
    let offsets: Vec<f64> = cell
        .wires
        .iter()
        .map(|w| wire_offset(cell, slot, w.x, w.y))
        .collect();
    periodic_response(layers, &offsets)
}

/// Wire charges for reading out the tube.
pub fn tube_charges(cell: &CheckedCell, layers: &[SignalLayer]) -> Vec<f64> {
    periodic_response(layers, &vec![-1.0; cell.wires.len()])
}

/// Fill in the anode-cathode gap of every strip and pixel that has none.
///
/// The default gap is the distance to the opposite plane or, failing
/// that, to the nearest wire.
pub fn assign_gaps(cell: &mut CheckedCell) -> Result<()> {
    for slot in PlaneSlot::ALL {
        let default = default_gap(cell, slot);
        let Some(plane) = cell.planes[slot.index()].as_mut() else {
            continue;
        };
        for (element, gap) in plane.gaps_mut() {
            if gap.is_none() {
                *gap = default;
            }
            if gap.is_none() {
                error!(
                    "PrepareStrips: not able to set a default anode-cathode gap for a {} of plane {}",
                    element, slot
                );
                return Err(FieldError::MissingGap {
                    element,
                    plane: slot.index(),
                });
            }
        }
    }
    Ok(())
}

fn default_gap(cell: &CheckedCell, slot: PlaneSlot) -> Option<f64> {
    if !cell.has_plane(slot) {
        return None;
    }
    let c = cell.coord(slot);
    if cell.has_plane(slot.partner()) {
        return Some((cell.coord(slot.partner()) - c).abs());
    }
    cell.wires
        .iter()
        .map(|w| {
            let u = match slot.axis() {
                Axis::X => w.x,
                Axis::Y => w.y,
            };
            if slot.is_low() {
                u - c
            } else {
                c - u
            }
        })
        .reduce(f64::min)
        .filter(|gap| *gap > 0.0)
}
