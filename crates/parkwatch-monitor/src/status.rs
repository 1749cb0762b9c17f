//! Text rendering of the slot table.

use std::fmt::Write as _;

use parkwatch_core::{ParkingRegistry, Slot};

const RULE: &str =
    "+------+-------------+----------+--------------+----------------------------------+----------+";

/// Render one row per slot followed by the parked count.
///
/// ```text
/// +------+-------------+----------+--------------+----------------------------------+----------+
/// | Slot |    Distance |    State | Plate        | User                             | Since    |
/// +------+-------------+----------+--------------+----------------------------------+----------+
/// |    1 |    400.0 cm |     free | -            | -                                | -        |
/// +------+-------------+----------+--------------+----------------------------------+----------+
/// parked 0/1
/// ```
#[must_use]
pub fn render(slots: &[Slot], registry: &ParkingRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "| {:>4} | {:>11} | {:>8} | {:<12} | {:<32} | {:<8} |",
        "Slot", "Distance", "State", "Plate", "User", "Since"
    );
    let _ = writeln!(out, "{RULE}");

    for slot in slots {
        let vehicle = registry.get(slot.id());
        let plate = vehicle.map_or("-", |v| v.plate.as_str());
        let user = vehicle.and_then(|v| v.user_id.as_deref()).unwrap_or("-");
        let since = vehicle.map_or_else(
            || "-".to_string(),
            |v| v.parked_at.format("%H:%M:%S").to_string(),
        );
        let _ = writeln!(
            out,
            "| {:>4} | {:>8.1} cm | {:>8} | {:<12} | {:<32} | {:<8} |",
            slot.id().get(),
            slot.distance_cm,
            if slot.occupied { "occupied" } else { "free" },
            plate,
            user,
            since
        );
    }

    let _ = writeln!(out, "{RULE}");
    let _ = write!(out, "parked {}/{}", registry.len(), registry.capacity());
    out
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use chrono::{TimeZone, Utc};
    use parkwatch_core::{ParkedVehicle, SlotId};

    use super::*;

    fn slots(n: usize) -> Vec<Slot> {
        let now = Instant::now();
        (0..n)
            .map(|i| Slot::new(SlotId::from_index(i), 400.0, Duration::from_secs(3), now))
            .collect()
    }

    #[test]
    fn empty_lot() {
        let table = render(&slots(2), &ParkingRegistry::with_capacity(2));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[3].contains("400.0 cm"));
        assert!(lines[3].contains("free"));
        assert_eq!(lines[6], "parked 0/2");
    }

    #[test]
    fn parked_vehicle_row() {
        let mut slots = slots(2);
        slots[1].occupied = true;
        slots[1].distance_cm = 6.5;

        let mut registry = ParkingRegistry::with_capacity(2);
        registry
            .insert(ParkedVehicle {
                plate: "51D-22222".to_string(),
                slot_id: SlotId::from_index(1),
                user_id: Some("U1".to_string()),
                history_id: Some("H1".to_string()),
                check_in_time: String::new(),
                check_out_time: String::new(),
                parked_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
            })
            .unwrap();

        let table = render(&slots, &registry);
        let row = table.lines().nth(4).unwrap();
        assert!(row.contains("6.5 cm"));
        assert!(row.contains("occupied"));
        assert!(row.contains("51D-22222"));
        assert!(row.contains("U1"));
        assert!(row.contains("08:30:00"));
        assert!(table.ends_with("parked 1/2"));
    }
}
