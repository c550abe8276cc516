use parking_occupancy::detect::{Detection, DetectionFilter, RegionForm};
use parking_occupancy::{
    aggregate, OccupancyClassifier, OccupancyRule, SlotId, SlotRegistry, VehicleDetectionSet,
    VehicleRegion,
};

const SINGLE_SLOT: &str = r#"{"1": [[0, 0], [10, 0], [10, 10], [0, 10]]}"#;

const THREE_SLOTS: &str = r#"{
    "1": [[0, 0], [10, 0], [10, 10], [0, 10]],
    "2": [[20, 0], [30, 0], [30, 10], [20, 10]],
    "3": [[40, 0], [50, 0], [50, 10], [40, 10]]
}"#;

fn registry() -> SlotRegistry {
    SlotRegistry::from_json_str(SINGLE_SLOT).expect("slot document")
}

#[test]
fn vehicle_centroid_inside_slot_fills_the_lot() {
    let slots = registry();
    let vehicles = VehicleDetectionSet::new(vec![VehicleRegion::center(5.0, 5.0)]);

    let classifier = OccupancyClassifier::new(OccupancyRule::CentroidContainment);
    let verdict = classifier.classify(&slots, &vehicles);
    assert_eq!(verdict.get(&SlotId::from(1u32)), Some(true));

    let stats = aggregate(&verdict);
    assert_eq!(stats.total_slots, 1);
    assert_eq!(stats.occupied, 1);
    assert_eq!(stats.vacant, 0);
    assert_eq!(stats.occupancy_rate, 100.0);
}

#[test]
fn distant_vehicle_leaves_slot_vacant_under_both_rules() {
    let slots = registry();
    let slot = SlotId::from(1u32);
    let vehicles = VehicleDetectionSet::new(vec![VehicleRegion::bbox(20.0, 20.0, 30.0, 30.0)]);

    for rule in [OccupancyRule::AreaOverlap, OccupancyRule::CentroidContainment] {
        let verdict = OccupancyClassifier::new(rule).classify(&slots, &vehicles);
        assert_eq!(verdict.get(&slot), Some(false), "rule {}", rule);
        assert_eq!(aggregate(&verdict).occupancy_rate, 0.0);
    }
}

#[test]
fn one_vehicle_in_a_three_slot_lot() {
    let slots = SlotRegistry::from_json_str(THREE_SLOTS).unwrap();
    // Over slot 2 only.
    let car = VehicleRegion::bbox(22.0, 2.0, 28.0, 8.0);

    for rule in [OccupancyRule::AreaOverlap, OccupancyRule::CentroidContainment] {
        let region = match rule.region_form() {
            RegionForm::Center => VehicleRegion::Center(car.centroid()),
            RegionForm::Box => car,
        };
        let vehicles = VehicleDetectionSet::new(vec![region]);
        let verdict = OccupancyClassifier::new(rule).classify(&slots, &vehicles);
        let occupied: Vec<_> = verdict.iter().map(|(_, occupied)| occupied).collect();
        assert_eq!(occupied, vec![false, true, false], "rule {}", rule);

        let stats = aggregate(&verdict);
        assert_eq!(stats.total_slots, slots.len());
        assert_eq!(stats.occupied + stats.vacant, stats.total_slots);
        assert_eq!(stats.occupied, 1);
        assert_eq!(stats.vacant, 2);
        assert_eq!(stats.occupancy_rate, 33.3);
    }
}

#[test]
fn containing_rectangle_always_occupies() {
    let raw = r#"{"a": [[2, 2], [8, 3], [7, 9], [3, 8]], "b": [[40, 40], [50, 40], [45, 50]]}"#;
    let slots = SlotRegistry::from_json_str(raw).unwrap();
    let vehicles = VehicleDetectionSet::new(vec![VehicleRegion::bbox(0.0, 0.0, 10.0, 10.0)]);

    for rule in [OccupancyRule::AreaOverlap, OccupancyRule::CentroidContainment] {
        let verdict = OccupancyClassifier::new(rule).classify(&slots, &vehicles);
        assert_eq!(verdict.get(&SlotId::from("a")), Some(true));
        assert_eq!(verdict.get(&SlotId::from("b")), Some(false));
    }
}

#[test]
fn slot_centroid_occupies_convex_slot() {
    let raw = r#"{"7": [[100, 50], [160, 60], [150, 120], [95, 110]]}"#;
    let slots = SlotRegistry::from_json_str(raw).unwrap();
    let slot = &slots.slots()[0];
    let centroid = slot.polygon().centroid();
    let vehicles = VehicleDetectionSet::new(vec![VehicleRegion::Center(centroid)]);

    let classifier = OccupancyClassifier::new(OccupancyRule::CentroidContainment);
    let verdict = classifier.classify(&slots, &vehicles);
    assert_eq!(verdict.occupied_count(), 1);
}

#[test]
fn detector_output_flows_through_filter_and_rule() {
    let slots = SlotRegistry::from_json_str(THREE_SLOTS).unwrap();
    let low_confidence = Detection::vehicle(21.0, 1.0, 29.0, 9.0).with_confidence(0.2);
    let detections = vec![
        Detection::vehicle(1.0, 1.0, 9.0, 9.0),
        // low confidence car over slot 2
        low_confidence,
        // person over slot 3
        Detection::vehicle(41.0, 1.0, 49.0, 9.0).with_class(0),
    ];

    for rule in [OccupancyRule::AreaOverlap, OccupancyRule::CentroidContainment] {
        let vehicles = VehicleDetectionSet::from_detections(
            &detections,
            &DetectionFilter::default(),
            rule.region_form(),
            None,
        );
        assert_eq!(vehicles.len(), 1);
        let verdict = OccupancyClassifier::new(rule).classify(&slots, &vehicles);
        let ids: Vec<_> = verdict
            .iter()
            .map(|(id, occupied)| (id.as_str(), occupied))
            .collect();
        assert_eq!(ids, vec![("1", true), ("2", false), ("3", false)]);
    }
}

#[test]
fn center_form_never_overlaps_by_area() {
    let slots = registry();
    let vehicles = VehicleDetectionSet::from_detections(
        &[Detection::vehicle(1.0, 1.0, 9.0, 9.0)],
        &DetectionFilter::default(),
        RegionForm::Center,
        None,
    );
    let verdict = OccupancyClassifier::new(OccupancyRule::AreaOverlap).classify(&slots, &vehicles);
    assert_eq!(verdict.occupied_count(), 0);
}
