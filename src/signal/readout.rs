//! Readout groups: the electrodes whose induced signal is summed.

use crate::cell::{CheckedCell, Electrode, PlaneSlot, StripDirection};

/// A strip identified by its plane, orientation and position in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripRef {
    pub slot: PlaneSlot,
    pub direction: StripDirection,
    pub index: usize,
}

/// A pixel identified by its plane and position in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRef {
    pub slot: PlaneSlot,
    pub index: usize,
}

/// All electrodes of a cell sharing one readout label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadoutGroup {
    pub label: String,
    pub electrodes: Vec<Electrode>,
    pub strips: Vec<StripRef>,
    pub pixels: Vec<PixelRef>,
}

impl ReadoutGroup {
    /// Collect the members of `label` in a checked cell.
    pub fn collect(cell: &CheckedCell, label: &str) -> Self {
        let mut group = Self {
            label: label.to_string(),
            ..Self::default()
        };
        for (i, wire) in cell.wires.iter().enumerate() {
            if wire.label == label {
                group.electrodes.push(Electrode::Wire(i));
            }
        }
        for slot in PlaneSlot::ALL {
            let Some(plane) = cell.plane(slot) else {
                continue;
            };
            if plane.label == label {
                group.electrodes.push(Electrode::Plane(slot));
            }
            for direction in [StripDirection::InPlane, StripDirection::AlongZ] {
                for (index, strip) in plane.strips(direction).iter().enumerate() {
                    if strip.label == label {
                        group.strips.push(StripRef { slot, direction, index });
                    }
                }
            }
            for (index, pixel) in plane.pixels.iter().enumerate() {
                if pixel.label == label {
                    group.pixels.push(PixelRef { slot, index });
                }
            }
        }
        if cell.tube.as_ref().is_some_and(|t| t.label == label) {
            group.electrodes.push(Electrode::Tube);
        }
        group
    }

    /// Whether nothing in the cell carries this label.
    pub fn is_empty(&self) -> bool {
        self.electrodes.is_empty() && self.strips.is_empty() && self.pixels.is_empty()
    }

    /// Number of wires in the group.
    pub fn wire_count(&self) -> usize {
        self.electrodes
            .iter()
            .filter(|e| matches!(e, Electrode::Wire(_)))
            .count()
    }
}
