//! Plain-text rendering of a pet for the terminal front end.
//!
//! Nothing here feeds back into the engine; it only formats snapshots.

use crate::pet::{Attribute, LifeStage, PetSnapshot, ATTRIBUTE_MAX};

/// One attribute as a fixed-width bar, e.g. `hunger       [###.] 3/4`.
pub fn attribute_bar(attribute: Attribute, value: i32) -> String {
    let filled = value.clamp(0, ATTRIBUTE_MAX) as usize;
    let empty = ATTRIBUTE_MAX as usize - filled;
    format!(
        "{:<12} [{}{}] {}/{}",
        attribute.label(),
        "#".repeat(filled),
        ".".repeat(empty),
        value,
        ATTRIBUTE_MAX
    )
}

/// Short symbol shown next to the stage name.
pub fn stage_icon(stage: LifeStage) -> &'static str {
    match stage {
        LifeStage::Egg => "(o)",
        LifeStage::Baby => "(^.^)",
        LifeStage::Child => "(^o^)",
        LifeStage::Teen => "(-_-)",
        LifeStage::Adult => "(*_*)",
        LifeStage::Senior => "(u_u)",
        LifeStage::Dead => "(x_x)",
    }
}

pub fn stage_line(name: &str, stage: LifeStage) -> String {
    format!("{} {} is now {}", stage_icon(stage), name, stage)
}

/// Full multi-line status block.
pub fn render(snapshot: &PetSnapshot) -> String {
    let mut lines = Vec::with_capacity(5);
    lines.push(format!(
        "{} {} the {} ({:.1} min old)",
        stage_icon(snapshot.stage),
        snapshot.name,
        snapshot.stage,
        snapshot.age_minutes
    ));
    for attribute in Attribute::ALL {
        lines.push(format!("  {}", attribute_bar(attribute, snapshot.get(attribute))));
    }
    lines.join("\n")
}
