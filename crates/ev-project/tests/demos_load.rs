use std::path::Path;

#[test]
fn demos_load_and_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
    let demos = ["sedan.yaml", "dual_motor.json"];

    for name in demos {
        let path = root.join(name);
        let file =
            ev_project::load(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        ev_project::validate_project(&file)
            .unwrap_or_else(|e| panic!("Failed to validate {}: {}", name, e));
    }
}

#[test]
fn sedan_is_built_from_cells() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/sedan.yaml");
    let file = ev_project::load_yaml(&path).unwrap();
    assert!(matches!(
        file.battery,
        ev_project::BatteryDef::Cells {
            series: 96,
            parallel: 46,
            ..
        }
    ));
    assert_eq!(file.schedules.len(), 2);
    assert!(file.body.drives[0].motor.is_none());
}
