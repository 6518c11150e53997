//! End-to-end placement and explode scenarios

use approx::assert_relative_eq;
use av_core::{
    AssemblyConstraint, AssemblyConstraintResolver, AssemblyProject, BoundingBox, ExplodeConfig,
    ExplodedView, GeometrySource, InferenceConfig, InferenceResult, MachineCatalog, Part,
    PositionSource, ResolveError, SnapshotCell, TriangleMesh, apply_inference, share_mesh,
};
use glam::Vec3;

fn suspension_resolver() -> (AssemblyConstraintResolver, Vec<av_core::SharedMesh>) {
    let base = share_mesh(TriangleMesh::cuboid(
        Vec3::new(-5.0, 0.0, -5.0),
        Vec3::new(5.0, 5.0, 5.0),
    ));
    let rod = share_mesh(TriangleMesh::cuboid(
        Vec3::new(-0.5, 0.0, -0.5),
        Vec3::new(0.5, 20.0, 0.5),
    ));

    let mut resolver = AssemblyConstraintResolver::with_parts([
        Part::ground("Base"),
        Part::new("Rod")
            .with_constraint(AssemblyConstraint::stacked_on("Base", Vec3::ZERO))
            .with_explode(Vec3::Y, 30.0),
        Part::new("Nut")
            .with_constraint(AssemblyConstraint::threaded("Rod", 0.8))
            .with_explode(Vec3::Y, 50.0)
            .with_unscrew_turns(2.0),
    ]);
    resolver.register_mesh("Base", &base, 1.0);
    resolver.register_mesh("Rod", &rod, 1.0);
    (resolver, vec![base, rod])
}

#[test]
fn suspension_stack_resolves_and_explodes() {
    let (mut resolver, _meshes) = suspension_resolver();
    let snapshot = resolver.resolve_all().unwrap();

    assert_eq!(snapshot.get("Base"), Some(Vec3::ZERO));
    assert_eq!(snapshot.get("Rod"), Some(Vec3::new(0.0, 5.0, 0.0)));
    assert_eq!(snapshot.get("Nut"), Some(Vec3::new(0.0, 21.0, 0.0)));

    let view = ExplodedView::new(ExplodeConfig::default(), 0.5);

    let assembled = view.frame(resolver.parts(), &snapshot, 0.0);
    for part in &assembled {
        assert_eq!(part.position, part.assembled);
        assert_eq!(part.source, PositionSource::Resolved);
    }

    let exploded = view.frame(resolver.parts(), &snapshot, 1.0);
    assert_eq!(exploded[0].position, Vec3::ZERO);
    assert_relative_eq!(exploded[1].position.y, 35.0, epsilon = 1e-4);
    assert_relative_eq!(exploded[2].position.y, 71.0, epsilon = 1e-4);
    // Two full turns bring the nut back to its original orientation
    assert_relative_eq!((exploded[2].rotation * Vec3::X).x, 1.0, epsilon = 1e-4);
}

#[test]
fn rescaling_meshes_moves_stacked_parts() {
    let (mut resolver, _meshes) = suspension_resolver();
    resolver.resolve_all().unwrap();

    resolver.set_global_scale(2.0);
    assert_eq!(
        resolver.get_bounding_box("Base"),
        Some(BoundingBox::new(
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(10.0, 10.0, 10.0)
        ))
    );
    let snapshot = resolver.resolve_all().unwrap();
    assert_eq!(snapshot.get("Rod"), Some(Vec3::new(0.0, 10.0, 0.0)));
    assert_relative_eq!(snapshot.get("Nut").unwrap().y, 42.0, epsilon = 1e-4);
}

#[test]
fn published_snapshots_are_immutable() {
    let (mut resolver, _meshes) = suspension_resolver();
    let cell = SnapshotCell::new(resolver.resolve_all().unwrap());
    let before = cell.load();

    resolver.update_part_constraint(
        "Nut",
        Some(AssemblyConstraint::threaded("Rod", 0.5)),
    );
    cell.store(resolver.resolve_all().unwrap());

    assert_eq!(before.get("Nut"), Some(Vec3::new(0.0, 21.0, 0.0)));
    assert_eq!(cell.load().get("Nut"), Some(Vec3::new(0.0, 15.0, 0.0)));
}

#[test]
fn cycles_are_reported_not_hung() {
    let mut resolver = AssemblyConstraintResolver::with_parts([
        Part::new("A").with_constraint(AssemblyConstraint::stacked_on("B", Vec3::ZERO)),
        Part::new("B").with_constraint(AssemblyConstraint::stacked_on("A", Vec3::ZERO)),
    ]);
    match resolver.resolve_all() {
        Err(ResolveError::CyclicDependency { chain }) => {
            assert_eq!(chain.first(), chain.last());
            assert!(chain.len() >= 3);
        }
        other => panic!("expected a cycle, got {:?}", other),
    }
}

#[test]
fn catalog_and_inference_feed_the_view() {
    let catalog = MachineCatalog::from_ron(
        r#"(machines: [(
            id: "Suspension",
            ground: Some("BASE"),
            forced_axis: Some((0.0, 1.0, 0.0)),
            parts: [
                (name: "BASE"),
                (name: "ROD", parent: Some("BASE")),
                (name: "SPRING"),
            ],
        )])"#,
    )
    .unwrap();
    let machine = catalog.get("suspension").unwrap();

    let project = AssemblyProject {
        parts: machine.to_parts(),
        ..AssemblyProject::new("Suspension")
    }
    .with_geometry(
        "BASE",
        GeometrySource::Cuboid {
            min: Vec3::new(-5.0, 0.0, -5.0),
            max: Vec3::new(5.0, 5.0, 5.0),
        },
    )
    .with_geometry(
        "ROD",
        GeometrySource::Cuboid {
            min: Vec3::ZERO,
            max: Vec3::new(1.0, 20.0, 1.0),
        },
    );

    let dir = tempfile::tempdir().unwrap();
    let mut session = project.build_session(dir.path(), 1.0).unwrap();
    session.resolver.resolve_all().unwrap();

    let inference = InferenceResult::from_json(
        r#"{"confidence": 0.9, "parts": [
            {"part_id": "spring_coil", "position": [3, 8, 0], "explode_direction": [1, 0, 0]},
            {"part_id": "wheel", "position": [9, 9, 9]}
        ]}"#,
    )
    .unwrap();
    let report =
        apply_inference(&mut session.resolver, &inference, &InferenceConfig::default()).unwrap();
    assert_eq!(report.skipped, vec!["wheel".to_string()]);

    let view = ExplodedView::new(ExplodeConfig::default(), 0.5).with_forced_axis(machine.forced_axis);
    let frame = view.frame(session.resolver.parts(), &report.snapshot, 1.0);
    let rod = frame.iter().find(|p| p.name == "ROD").unwrap();
    let spring = frame.iter().find(|p| p.name == "SPRING").unwrap();

    assert_eq!(rod.assembled, Vec3::new(0.0, 5.0, 0.0));
    assert_eq!(spring.source, PositionSource::Inferred);
    assert_eq!(spring.assembled, Vec3::new(3.0, 8.0, 0.0));
    // Forced Y axis: the inferred X direction has no Y component, so the
    // axis itself is used
    assert_relative_eq!(spring.position.x, 3.0, epsilon = 1e-4);
    assert!(spring.position.y > spring.assembled.y);
}
