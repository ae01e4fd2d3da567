use geo::Coord;
use geocluster::IndexKind;
use geocluster::index::{IndexEntry, SpatialIndex, create_index};
use quickcheck::{QuickCheck, TestResult};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Site {
    x: f64,
    y: f64,
    id: u32,
}

impl IndexEntry for Site {
    fn x(&self) -> f64 {
        self.x
    }

    fn y(&self) -> f64 {
        self.y
    }
}

fn sites(raw: &[(u16, u16)]) -> Vec<Site> {
    // a coarse lattice so that duplicates and boundary hits are common
    raw.iter()
        .enumerate()
        .map(|(i, &(a, b))| Site {
            x: f64::from(a % 64) / 64.0,
            y: f64::from(b % 64) / 64.0,
            id: i as u32,
        })
        .collect()
}

fn sorted_ids(entries: Vec<Site>) -> Vec<u32> {
    let mut ids: Vec<u32> = entries.into_iter().map(|s| s.id).collect();
    ids.sort_unstable();
    ids
}

fn build(kind: IndexKind, entries: &[Site], radius: f64) -> Box<dyn SpatialIndex<Site>> {
    let mut index = create_index(kind, radius);
    for &entry in entries {
        index.insert(entry);
    }
    index
}

fn indexes_agree(raw: Vec<(u16, u16)>, center: (u16, u16), radius: u8, deletions: u8) -> TestResult {
    if raw.is_empty() {
        return TestResult::discard();
    }
    let entries = sites(&raw);
    let radius = f64::from(radius % 32) / 64.0;
    let center = Coord {
        x: f64::from(center.0 % 64) / 64.0,
        y: f64::from(center.1 % 64) / 64.0,
    };
    let lower_left = Coord {
        x: center.x - radius,
        y: center.y - radius,
    };
    let upper_right = Coord {
        x: center.x + radius,
        y: center.y + radius,
    };

    let mut indexes: Vec<Box<dyn SpatialIndex<Site>>> = IndexKind::ALL
        .iter()
        .map(|&kind| build(kind, &entries, radius.max(1.0 / 64.0)))
        .collect();

    let removed = usize::from(deletions) % (entries.len() + 1);
    for index in &mut indexes {
        for entry in &entries[..removed] {
            if !index.delete(entry) {
                return TestResult::failed();
            }
        }
    }

    let expected_within = sorted_ids(indexes[0].within(center, radius));
    let expected_range = sorted_ids(indexes[0].range(lower_left, upper_right));
    for index in &indexes[1..] {
        if index.len() != entries.len() - removed
            || sorted_ids(index.within(center, radius)) != expected_within
            || sorted_ids(index.range(lower_left, upper_right)) != expected_range
        {
            return TestResult::failed();
        }
    }

    // exactness against a linear scan
    let brute: Vec<Site> = entries[removed..]
        .iter()
        .copied()
        .filter(|s| {
            let (dx, dy) = (s.x - center.x, s.y - center.y);
            dx * dx + dy * dy <= radius * radius
        })
        .collect();
    TestResult::from_bool(sorted_ids(brute) == expected_within)
}

#[test]
fn test_index_equivalence_property() {
    QuickCheck::new()
        .tests(200)
        .quickcheck(indexes_agree as fn(Vec<(u16, u16)>, (u16, u16), u8, u8) -> TestResult);
}

#[test]
fn test_colocated_entries_are_kept() {
    for kind in IndexKind::ALL {
        let entries: Vec<Site> = (0..5).map(|id| Site { x: 0.5, y: 0.5, id }).collect();
        let mut index = build(kind, &entries, 0.1);
        assert_eq!(index.len(), 5);
        assert_eq!(sorted_ids(index.within(Coord { x: 0.5, y: 0.5 }, 0.0)), vec![0, 1, 2, 3, 4]);

        assert!(index.delete(&entries[2]));
        assert!(!index.delete(&entries[2]));
        assert_eq!(sorted_ids(index.within(Coord { x: 0.5, y: 0.5 }, 0.0)), vec![0, 1, 3, 4]);
        assert_eq!(index.kind(), kind);
    }
}

#[test]
fn test_bulk_load_matches_inserts() {
    let raw: Vec<(u16, u16)> = (0..300u16).map(|i| (i.wrapping_mul(37), i.wrapping_mul(91))).collect();
    let entries = sites(&raw);
    for kind in IndexKind::ALL {
        let inserted = build(kind, &entries, 0.05);
        let mut loaded = create_index(kind, 0.05);
        loaded.load(entries.clone());

        let center = Coord { x: 0.4, y: 0.6 };
        assert_eq!(loaded.len(), inserted.len());
        assert_eq!(
            sorted_ids(loaded.within(center, 0.2)),
            sorted_ids(inserted.within(center, 0.2)),
            "{}",
            kind
        );
        assert_eq!(
            sorted_ids(loaded.range(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.5, y: 0.5 })),
            sorted_ids(inserted.range(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.5, y: 0.5 })),
            "{}",
            kind
        );
    }
}
