//! Integration tests for config-to-csv
//! Unit-level suites live under `unit/`; end-to-end scenarios are below.

mod unit;

mod integration {
    //! User scenarios driven through the controller with real file storage

    use chrono::Utc;
    use config_to_csv::config::{AppConfig, JsonFileStore, KeyValueStore, RowValidator, Settings};
    use config_to_csv::services::{
        Action, Confirmation, CsvExporter, DispatchOutcome, FormController, SessionError,
    };
    use config_to_csv::FieldId;
    use std::fs;
    use tempfile::TempDir;

    const STAFF_FORM: &str = "\
textbox*: Full Name
dropdown*: Gender | Male, Female, Other

textbox: Email Address
dropdown: Department | Sales, Marketing, IT, HR
";

    fn controller<S: KeyValueStore>(store: S, dir: &TempDir) -> FormController<S> {
        FormController::new(
            store,
            CsvExporter::new(dir.path().join("exports")),
            RowValidator::default(),
        )
    }

    fn dispatch<S: KeyValueStore>(controller: &mut FormController<S>, action: Action) -> DispatchOutcome {
        controller.dispatch(action).unwrap()
    }

    fn enter_row<S: KeyValueStore>(controller: &mut FormController<S>, values: &[(&str, &str)]) -> DispatchOutcome {
        for (id, value) in values {
            dispatch(
                controller,
                Action::SetField {
                    field_id: FieldId::new(*id),
                    value: value.to_string(),
                },
            );
        }
        dispatch(controller, Action::SubmitRow)
    }

    fn read_records(path: &std::path::Path, has_headers: bool) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|record| record.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_staff_form_entry_and_export() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(JsonFileStore::open(dir.path().join("settings.json")).unwrap(), &dir);

        dispatch(&mut controller, Action::EditConfig(STAFF_FORM.to_string()));
        assert!(dispatch(&mut controller, Action::Generate).is_accepted());

        let ids: Vec<&str> = controller
            .state()
            .schema()
            .unwrap()
            .iter()
            .map(|field| field.id.as_str())
            .collect();
        assert_eq!(ids, ["textbox-0", "dropdown-1", "textbox-2", "dropdown-3"]);

        let outcome = enter_row(
            &mut controller,
            &[
                ("textbox-0", "Doe, Jane \"JD\""),
                ("dropdown-1", "Female"),
                ("dropdown-3", "IT"),
            ],
        );
        assert!(outcome.is_accepted());

        let outcome = enter_row(&mut controller, &[("textbox-0", "Bob"), ("dropdown-1", "Unknown")]);
        assert_eq!(outcome.refused, Some(SessionError::InvalidRow { error_count: 1 }));
        assert!(enter_row(&mut controller, &[("dropdown-1", "Male"), ("textbox-2", "bob@example.com")]).is_accepted());

        dispatch(&mut controller, Action::SetFileName("staff".to_string()));
        let exported = dispatch(&mut controller, Action::Export { at: Utc::now() })
            .exported
            .unwrap();

        assert_eq!(exported.path, dir.path().join("exports").join("staff.csv"));
        let content = fs::read_to_string(&exported.path).unwrap();
        assert!(content.starts_with("Full Name,Gender,Email Address,Department\n"));
        assert!(!content.ends_with('\n'));

        assert_eq!(
            read_records(&exported.path, true),
            vec![
                vec!["Doe, Jane \"JD\"", "Female", "", "IT"],
                vec!["Bob", "Male", "bob@example.com", ""],
            ]
        );
    }

    #[test]
    fn test_settings_survive_restart() {
        let dir = TempDir::new().unwrap();
        let settings_path = dir.path().join("state").join("settings.json");

        {
            let mut controller = controller(JsonFileStore::open(&settings_path).unwrap(), &dir);
            dispatch(&mut controller, Action::EditConfig("textbox*: Name".to_string()));
            dispatch(&mut controller, Action::SetFileName("names".to_string()));
            dispatch(&mut controller, Action::SetRemoveHeaders(true));
        }

        let store = JsonFileStore::open(&settings_path).unwrap();
        assert_eq!(
            Settings::load(&store),
            Settings {
                file_name: "names".to_string(),
                remove_headers: true,
                config_text: "textbox*: Name".to_string(),
            }
        );

        let mut controller = controller(store, &dir);
        assert!(controller.state().schema().is_none());
        dispatch(&mut controller, Action::Generate);
        enter_row(&mut controller, &[("textbox-0", "Ann")]);

        let exported = dispatch(&mut controller, Action::Export { at: Utc::now() })
            .exported
            .unwrap();
        assert_eq!(fs::read_to_string(exported.path).unwrap(), "Ann");
    }

    #[test]
    fn test_regenerating_discards_rows_only_when_confirmed() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(config_to_csv::config::MemoryStore::new(), &dir);

        dispatch(&mut controller, Action::EditConfig("textbox*: Name".to_string()));
        dispatch(&mut controller, Action::Generate);
        enter_row(&mut controller, &[("textbox-0", "Ann")]);

        dispatch(&mut controller, Action::EditConfig("textbox*: Name\ntextbox: City".to_string()));
        dispatch(&mut controller, Action::Generate);
        assert!(controller.state().confirmation().is_pending());

        let blocked = dispatch(&mut controller, Action::Export { at: Utc::now() });
        assert_eq!(blocked.refused, Some(SessionError::AwaitingConfirmation));
        assert!(blocked.exported.is_none());

        dispatch(&mut controller, Action::Reject);
        assert_eq!(controller.state().schema().unwrap().len(), 1);
        assert_eq!(controller.state().rows().len(), 1);

        dispatch(&mut controller, Action::Generate);
        dispatch(&mut controller, Action::Confirm);
        assert_eq!(controller.state().confirmation(), &Confirmation::Idle);
        assert_eq!(controller.state().schema().unwrap().len(), 2);
        assert!(controller.state().rows().is_empty());
    }

    #[test]
    fn test_generated_file_name_uses_configured_prefix() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            format!(
                "[export]\ndirectory = {:?}\nfile_name_prefix = \"survey\"\n\n[validation]\nmax_text_length = 5\n",
                dir.path().join("out")
            ),
        )
        .unwrap();
        let app_config = AppConfig::load(&config_path).unwrap();

        let exporter = CsvExporter::new(&app_config.export.directory)
            .with_file_name_prefix(&app_config.export.file_name_prefix);
        let validator = RowValidator::with_max_text_length(app_config.validation.max_text_length);
        let mut controller = FormController::new(config_to_csv::config::MemoryStore::new(), exporter, validator);

        dispatch(&mut controller, Action::EditConfig("textbox: Word".to_string()));
        dispatch(&mut controller, Action::Generate);
        let too_long = enter_row(&mut controller, &[("textbox-0", "toolong")]);
        assert_eq!(too_long.refused, Some(SessionError::InvalidRow { error_count: 1 }));
        assert!(enter_row(&mut controller, &[("textbox-0", "short")]).is_accepted());

        let exported = dispatch(&mut controller, Action::Export { at: Utc::now() })
            .exported
            .unwrap();
        let name = exported.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("survey_"), "unexpected name {}", name);
        assert!(name.ends_with(".csv"));
        assert_eq!(exported.path.parent().unwrap(), dir.path().join("out"));
        assert_eq!(read_records(&exported.path, false), vec![vec!["Word"], vec!["short"]]);
    }
}
