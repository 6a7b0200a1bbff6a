#![allow(dead_code)]

use tabula_frame::{Column, Table, Value};

/// Mammal sleep records. `vore` has four distinct values plus nulls.
pub fn sleep_data() -> Table {
    let rows: [(&str, &str, Option<&str>, &str, f64, Option<f64>, f64); 12] = [
        ("Cheetah", "Acinonyx", Some("carni"), "Carnivora", 12.1, None, 50.0),
        ("Owl monkey", "Aotus", Some("omni"), "Primates", 17.0, Some(1.8), 0.48),
        ("Mountain beaver", "Aplodontia", Some("herbi"), "Rodentia", 14.4, Some(2.4), 1.35),
        ("Greater short-tailed shrew", "Blarina", Some("omni"), "Soricomorpha", 14.9, Some(2.3), 0.019),
        ("Cow", "Bos", Some("herbi"), "Artiodactyla", 4.0, Some(0.7), 600.0),
        ("Three-toed sloth", "Bradypus", Some("herbi"), "Pilosa", 14.4, Some(2.2), 3.85),
        ("Northern fur seal", "Callorhinus", Some("carni"), "Carnivora", 8.7, Some(1.4), 20.49),
        ("Vesper mouse", "Calomys", None, "Rodentia", 7.0, None, 0.045),
        ("Dog", "Canis", Some("carni"), "Carnivora", 10.1, Some(2.9), 14.0),
        ("Big brown bat", "Eptesicus", Some("insecti"), "Chiroptera", 19.7, Some(3.9), 0.023),
        ("Roe deer", "Capreolus", Some("herbi"), "Artiodactyla", 3.0, None, 14.8),
        ("Vole", "Microtus", None, "Rodentia", 12.8, None, 0.035),
    ];

    Table::new(vec![
        Column::strings("name", rows.iter().map(|r| Some(r.0))),
        Column::strings("genus", rows.iter().map(|r| Some(r.1))),
        Column::strings("vore", rows.iter().map(|r| r.2)),
        Column::strings("order", rows.iter().map(|r| Some(r.3))),
        Column::doubles("sleep_total", rows.iter().map(|r| r.4)),
        Column::doubles("sleep_rem", rows.iter().map(|r| r.5)),
        Column::doubles("bodywt", rows.iter().map(|r| r.6)),
    ])
    .expect("fixture is well formed")
}

/// Three people; Anna's weight is unknown.
pub fn people() -> Table {
    Table::from_rows(
        &["first_name", "last_name", "age", "weight"],
        vec![
            vec!["Max".into(), "Doe".into(), 23.into(), 55.into()],
            vec!["Franz".into(), "Smith".into(), 23.into(), 88.into()],
            vec!["Horst".into(), "Keller".into(), 12.into(), 82.into()],
            vec!["Anna".into(), "Doe".into(), 12.into(), Value::Null],
        ],
    )
    .expect("fixture is well formed")
}

/// The first people fixture rows extended with a nullable `sex` column.
pub fn persons() -> Table {
    Table::from_rows(
        &["first_name", "last_name", "age", "sex"],
        vec![
            vec!["Max".into(), "Doe".into(), 23.into(), "m".into()],
            vec!["Franz".into(), "Smith".into(), 23.into(), "m".into()],
            vec!["Horst".into(), "Keller".into(), 12.into(), Value::Null],
        ],
    )
    .expect("fixture is well formed")
}

/// Small iris-like sample with two species.
pub fn flowers() -> Table {
    Table::new(vec![
        Column::doubles("Sepal.Length", [5.1, 4.9, 7.0, 6.4, 6.3]),
        Column::doubles("Sepal.Width", [3.5, 3.0, 3.2, 3.2, 3.3]),
        Column::doubles("Petal.Length", [1.4, 1.4, 4.7, 4.5, 6.0]),
        Column::doubles("Petal.Width", [0.2, 0.2, 1.4, 1.5, 2.5]),
        Column::strings(
            "Species",
            [
                Some("setosa"),
                Some("setosa"),
                Some("versicolor"),
                Some("versicolor"),
                Some("virginica"),
            ],
        ),
    ])
    .expect("fixture is well formed")
}

pub fn strings(table: &Table, column: &str) -> Vec<Option<String>> {
    table
        .column(column)
        .expect("column exists")
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
