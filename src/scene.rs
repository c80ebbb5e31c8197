use glam::DVec3;
use ratatui::style::Color;

/// The fixed set of structure models the viewer can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoleculeVariant {
    #[default]
    Dna,
    Protein,
    Cell,
}

impl MoleculeVariant {
    pub fn all() -> [MoleculeVariant; 3] {
        [
            MoleculeVariant::Dna,
            MoleculeVariant::Protein,
            MoleculeVariant::Cell,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            MoleculeVariant::Dna => "DNA",
            MoleculeVariant::Protein => "Protein",
            MoleculeVariant::Cell => "Cell",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MoleculeVariant::Dna => "Double helix structure showing base pairs",
            MoleculeVariant::Protein => "Amino acid chains and folding patterns",
            MoleculeVariant::Cell => "Basic cellular components and organelles",
        }
    }

    /// Unrecognized names resolve to the default structure rather than fail.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dna" => MoleculeVariant::Dna,
            "protein" => MoleculeVariant::Protein,
            "cell" => MoleculeVariant::Cell,
            _ => MoleculeVariant::Dna,
        }
    }

    /// Whole-group rotation angles (pitch, yaw) in radians at elapsed time
    /// `t` seconds. Derived from wall-clock time, not frame deltas, so the
    /// apparent speed is independent of refresh rate.
    pub fn group_rotation(&self, t: f64) -> (f64, f64) {
        match self {
            MoleculeVariant::Dna => (0.0, t * 0.2),
            MoleculeVariant::Protein => ((t * 0.3).sin() * 0.2, t * 0.1),
            MoleculeVariant::Cell => (0.0, t * 0.05),
        }
    }

    /// Spin rate (rad/s) of individually rotating primitives.
    pub fn primitive_spin_rate(&self) -> f64 {
        match self {
            MoleculeVariant::Dna => 0.5,
            MoleculeVariant::Protein | MoleculeVariant::Cell => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub center: DVec3,
    pub radius: f64,
    pub color: Color,
    pub label: Option<&'static str>,
    /// Rotates about its own vertical axis in addition to the group motion.
    pub spins: bool,
}

/// Straight connector between two points, used for the DNA backbone.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub from: DVec3,
    pub to: DVec3,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescription {
    pub primitives: Vec<Primitive>,
    pub backbone: Vec<Connector>,
}

const BACKBONE_COLOR: Color = Color::Rgb(0x8b, 0x5c, 0xf6);

// Base sphere positions, colors and labels of the DNA model.
const DNA_BASES: [([f64; 3], Color, &str); 6] = [
    ([2.0, 2.0, 0.0], Color::Rgb(0xff, 0x6b, 0x6b), "A"),
    ([-2.0, 2.0, 0.0], Color::Rgb(0x4e, 0xcd, 0xc4), "T"),
    ([1.5, 1.0, 1.0], Color::Rgb(0x45, 0xb7, 0xd1), "G"),
    ([-1.5, 1.0, 1.0], Color::Rgb(0x96, 0xce, 0xb4), "C"),
    ([2.0, 0.0, 2.0], Color::Rgb(0xff, 0xd9, 0x3d), "A"),
    ([-2.0, 0.0, 2.0], Color::Rgb(0xff, 0x9f, 0xf3), "T"),
];

/// Build the renderable description for a variant. Pure and total over the
/// variant set; switching variants replaces the whole description.
pub fn build(variant: MoleculeVariant) -> SceneDescription {
    match variant {
        MoleculeVariant::Dna => build_dna(),
        MoleculeVariant::Protein => build_protein(),
        MoleculeVariant::Cell => build_cell(),
    }
}

fn build_dna() -> SceneDescription {
    let primitives = DNA_BASES
        .iter()
        .map(|(pos, color, label)| Primitive {
            center: DVec3::from_array(*pos),
            radius: 0.3,
            color: *color,
            label: Some(*label),
            spins: true,
        })
        .collect();

    // One vertical strut below each base except the last, unit length.
    let backbone = DNA_BASES[..DNA_BASES.len() - 1]
        .iter()
        .map(|(pos, _, _)| Connector {
            from: DVec3::new(0.0, pos[1] - 1.0, pos[2] + 0.5),
            to: DVec3::new(0.0, pos[1], pos[2] + 0.5),
            color: BACKBONE_COLOR,
        })
        .collect();

    SceneDescription {
        primitives,
        backbone,
    }
}

fn build_protein() -> SceneDescription {
    let primitives = (0..8)
        .map(|i| {
            let t = i as f64;
            Primitive {
                center: DVec3::new(t.cos() * 2.0, t * 0.5 - 2.0, t.sin() * 2.0),
                radius: 0.2,
                color: hsl_color(t * 45.0, 0.7, 0.6),
                label: None,
                spins: false,
            }
        })
        .collect();

    SceneDescription {
        primitives,
        backbone: Vec::new(),
    }
}

fn build_cell() -> SceneDescription {
    let mut primitives = vec![
        // Membrane
        Primitive {
            center: DVec3::ZERO,
            radius: 3.0,
            color: Color::Rgb(0x88, 0xcc, 0xff),
            label: None,
            spins: false,
        },
        // Nucleus
        Primitive {
            center: DVec3::ZERO,
            radius: 1.0,
            color: Color::Rgb(0xff, 0x88, 0x88),
            label: None,
            spins: false,
        },
    ];

    for i in 0..6 {
        let t = i as f64;
        primitives.push(Primitive {
            center: DVec3::new(t.cos() * 2.0, t.sin() * 2.0, (t * 2.0).cos()),
            radius: 0.3,
            color: Color::Rgb(0x88, 0xff, 0x88),
            label: None,
            spins: false,
        });
    }

    SceneDescription {
        primitives,
        backbone: Vec::new(),
    }
}

/// HSL to terminal RGB, hue in degrees.
fn hsl_color(hue: f64, saturation: f64, lightness: f64) -> Color {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let (r1, g1, b1) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    let to_byte = |v: f64| ((v + m) * 255.0).round() as u8;
    Color::Rgb(to_byte(r1), to_byte(g1), to_byte(b1))
}
