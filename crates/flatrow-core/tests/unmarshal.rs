//! Decoding passes over CSV fixtures.

use flatrow_core::{
    Binding, BoxError, CancellationToken, CsvSource, Error, ErrorKind, Mapper, Marshal, Options,
    Unmarshal, detect_source, flat_record, handoff, marshal_iter, unmarshal_to_channel,
    unmarshal_to_vec, unmarshal_with_callback,
};
use std::fs::File;
use std::path::PathBuf;

flat_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Pirate {
        #[flat("first_name")]
        first_name: String,
        #[flat("last_name")]
        last_name: String,
        #[flat("age")]
        age: i32,
        #[flat("height")]
        height: f32,
    }
}

flat_record! {
    #[derive(Debug, Default, PartialEq)]
    struct MaybePirate {
        #[flat("first_name")]
        first_name: String,
        #[flat("last_name")]
        last_name: Option<String>,
        #[flat("age")]
        age: i32,
        #[flat("height")]
        height: f32,
    }
}

fn test_data(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data/unmarshal");
    path.push(name);
    path
}

fn pirate(first_name: &str, last_name: &str, age: i32, height: f32) -> Pirate {
    Pirate {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        age,
        height,
    }
}

fn expected_pirates() -> Vec<Pirate> {
    vec![
        pirate("Guybrush", "Threepwood", 28, 1.78),
        pirate("Elaine", "Marley", 20, 1.6),
        pirate("LeChuck", "", 100, 2.01),
    ]
}

#[tokio::test]
async fn test_success_to_vec() {
    let cancel = CancellationToken::new();
    let source = detect_source(File::open(test_data("success.csv")).unwrap()).unwrap();

    let got: Vec<Pirate> = unmarshal_to_vec(&cancel, source, Options::strict())
        .await
        .unwrap();
    assert_eq!(got, expected_pirates());
}

#[tokio::test]
async fn test_success_detected_semicolon() {
    let cancel = CancellationToken::new();
    let source = detect_source(File::open(test_data("semicolon.csv")).unwrap()).unwrap();
    assert_eq!(source.delimiter(), b';');

    let got: Vec<Pirate> = unmarshal_to_vec(&cancel, source, Options::strict())
        .await
        .unwrap();
    assert_eq!(got, expected_pirates());
}

#[tokio::test]
async fn test_success_to_channel() {
    let cancel = CancellationToken::new();
    let source = detect_source(File::open(test_data("success.csv")).unwrap()).unwrap();
    let (tx, mut rx) = handoff::<Pirate>();

    let consumer = tokio::spawn(async move {
        let mut got = Vec::new();
        while let Some(p) = rx.recv().await {
            got.push(p);
        }
        got
    });

    unmarshal_to_channel(&cancel, source, Options::strict(), tx)
        .await
        .unwrap();
    assert_eq!(consumer.await.unwrap(), expected_pirates());
}

#[tokio::test]
async fn test_success_pointer() {
    let cancel = CancellationToken::new();
    let source = detect_source(File::open(test_data("success.csv")).unwrap()).unwrap();

    let got: Vec<Box<Pirate>> = unmarshal_to_vec(&cancel, source, Options::strict())
        .await
        .unwrap();
    let expected: Vec<Box<Pirate>> = expected_pirates().into_iter().map(Box::new).collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_success_callback() {
    let cancel = CancellationToken::new();
    let source = detect_source(File::open(test_data("success.csv")).unwrap()).unwrap();

    let mut got = Vec::new();
    unmarshal_with_callback(&cancel, source, Options::strict(), |p: Pirate| {
        got.push(p);
        Ok(())
    })
    .await
    .unwrap();
    assert_eq!(got, expected_pirates());
}

#[tokio::test]
async fn test_empty_cells_fail_without_ignore() {
    let cancel = CancellationToken::new();
    let source = detect_source(File::open(test_data("success_empty.csv")).unwrap()).unwrap();

    let err = unmarshal_to_vec::<MaybePirate, _>(&cancel, source, Options::strict())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnparsableValue);
    assert_eq!(err.row(), Some(0));
    match err {
        Error::Decode { source, .. } => {
            assert_eq!(source.column, 3);
            assert_eq!(source.field, "height");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_ignore_empty() {
    let cancel = CancellationToken::new();
    let source = detect_source(File::open(test_data("success_empty.csv")).unwrap()).unwrap();
    let options = Options {
        ignore_empty_on_decode: true,
        ..Options::strict()
    };

    let got: Vec<Pirate> = unmarshal_to_vec(&cancel, source, options).await.unwrap();
    assert_eq!(
        got,
        vec![
            pirate("Guybrush", "Threepwood", 28, 0.0),
            pirate("Elaine", "Marley", 0, 1.6),
            pirate("LeChuck", "", 0, 0.0),
        ]
    );
}

#[tokio::test]
async fn test_optional_and_ignore_empty() {
    let cancel = CancellationToken::new();
    let source = detect_source(File::open(test_data("success_empty.csv")).unwrap()).unwrap();
    let options = Options {
        ignore_empty_on_decode: true,
        ..Options::default()
    };

    let got: Vec<MaybePirate> = unmarshal_to_vec(&cancel, source, options).await.unwrap();
    assert_eq!(got[0].last_name.as_deref(), Some("Threepwood"));
    assert_eq!(got[2].last_name, None);
}

flat_record! {
    #[derive(Debug, Default, PartialEq)]
    struct Values {
        #[flat("VALUE")]
        value: Vec<i64>,
    }
}

#[tokio::test]
async fn test_int64_list() {
    let cancel = CancellationToken::new();
    let source = CsvSource::new("VALUE\n\"{1,2,3}\"\n".as_bytes());
    let options = Options {
        ignore_empty_on_decode: true,
        ..Options::strict()
    };

    let got: Vec<Values> = unmarshal_to_vec(&cancel, source, options).await.unwrap();
    assert_eq!(
        got,
        vec![Values {
            value: vec![1, 2, 3]
        }]
    );
}

flat_record! {
    #[derive(Debug, Default, PartialEq)]
    struct Aliased {
        #[flat("name")]
        name: String,
        #[flat("name")]
        alias: String,
        #[flat("age")]
        age: u8,
    }
}

#[test]
fn test_duplicate_header_never_double_assigns() {
    let headers = ["name", "age", "name"];
    let mapper = Mapper::<Aliased>::for_decode(&headers, Options::default()).unwrap();
    assert_eq!(mapper.binding(2), Some(Binding::Duplicate { first: 0 }));

    let got = mapper.unmarshal(&["Guybrush", "28", "LeChuck"]).unwrap();
    assert_eq!(
        got,
        Aliased {
            name: "Guybrush".into(),
            alias: String::new(),
            age: 28,
        }
    );

    let strict = Options {
        error_if_duplicate_headers: true,
        ..Options::default()
    };
    let err = Mapper::<Aliased>::for_decode(&headers, strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateHeader);
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Doubloons(u64);

impl Unmarshal for Doubloons {
    fn unmarshal(text: &str) -> Result<Self, BoxError> {
        let amount = text.strip_suffix(" doubloons").ok_or("missing unit")?;
        Ok(Doubloons(amount.parse()?))
    }
}

impl Marshal for Doubloons {
    fn marshal(&self) -> Result<String, BoxError> {
        Ok(format!("{} doubloons", self.0))
    }
}

flat_record! {
    #[derive(Debug, Default, PartialEq)]
    struct Bounty {
        #[flat("name")]
        name: String,
        #[flat("reward", custom)]
        reward: Doubloons,
    }
}

#[tokio::test]
async fn test_custom_unmarshal() {
    let cancel = CancellationToken::new();
    let source = CsvSource::new("name,reward\nLeChuck,500 doubloons\n".as_bytes());

    let got: Vec<Bounty> = unmarshal_to_vec(&cancel, source, Options::default())
        .await
        .unwrap();
    assert_eq!(got[0].reward, Doubloons(500));

    let source = CsvSource::new("name,reward\nLeChuck,500\n".as_bytes());
    let err = unmarshal_to_vec::<Bounty, _>(&cancel, source, Options::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CustomDecode);
}

flat_record! {
    #[derive(Debug, Default, PartialEq)]
    struct Crew {
        #[flat("name")]
        name: String,
        #[flat("-")]
        rank: u8,
        nickname: String,
    }
}

#[tokio::test]
async fn test_untagged_field_policy() {
    let cancel = CancellationToken::new();
    let data = "name,rank,nickname\nGuybrush,3,Mighty Pirate\n";

    let got: Vec<Crew> = unmarshal_to_vec(&cancel, CsvSource::new(data.as_bytes()), Options::default())
        .await
        .unwrap();
    assert_eq!(
        got,
        vec![Crew {
            name: "Guybrush".into(),
            rank: 0,
            nickname: String::new(),
        }]
    );

    let strict = Options {
        error_if_untagged_field: true,
        ..Options::default()
    };
    let err = unmarshal_to_vec::<Crew, _>(&cancel, CsvSource::new(data.as_bytes()), strict)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UntaggedField { field: "nickname" }));
}

flat_record! {
    #[derive(Debug, Default, PartialEq)]
    struct Survivor {
        #[flat("name")]
        name: String,
        #[flat("alive")]
        alive: bool,
    }
}

#[tokio::test]
async fn test_ignore_empty_bool_is_false() {
    let cancel = CancellationToken::new();
    let source = CsvSource::new("name,alive\nGuybrush,true\nLeChuck,\nElaine,T\n".as_bytes());
    let options = Options {
        ignore_empty_on_decode: true,
        ..Options::strict()
    };

    let got: Vec<Survivor> = unmarshal_to_vec(&cancel, source, options).await.unwrap();
    let alive: Vec<bool> = got.iter().map(|s| s.alive).collect();
    assert_eq!(alive, vec![true, false, true]);

    let source = CsvSource::new("name,alive\nLeChuck,\n".as_bytes());
    let err = unmarshal_to_vec::<Survivor, _>(&cancel, source, Options::strict())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnparsableValue);
}

flat_record! {
    #[derive(Debug, Default, PartialEq)]
    struct Wanted {
        #[flat("name")]
        name: String,
        #[flat("reward", custom)]
        reward: Option<Doubloons>,
    }
}

#[tokio::test]
async fn test_optional_custom_field() {
    let cancel = CancellationToken::new();
    let source = CsvSource::new("name,reward\nLeChuck,500 doubloons\nStan,\n".as_bytes());
    let options = Options {
        ignore_empty_on_decode: true,
        ..Options::default()
    };

    let got: Vec<Wanted> = unmarshal_to_vec(&cancel, source, options).await.unwrap();
    assert_eq!(got[0].reward, Some(Doubloons(500)));
    assert_eq!(got[1].reward, None);

    let source = CsvSource::new("name,reward\nStan,a few\n".as_bytes());
    let err = unmarshal_to_vec::<Wanted, _>(&cancel, source, Options::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CustomDecode);
}

#[tokio::test]
async fn test_optional_custom_field_marshals_nil() {
    let cancel = CancellationToken::new();
    let wanted = vec![
        Wanted {
            name: "LeChuck".into(),
            reward: Some(Doubloons(500)),
        },
        Wanted {
            name: "Stan".into(),
            reward: None,
        },
    ];

    let rows: Vec<Vec<String>> = marshal_iter(&cancel, wanted, Vec::new(), Options::default())
        .await
        .unwrap();
    assert_eq!(rows[1], vec!["LeChuck", "500 doubloons"]);
    assert_eq!(rows[2], vec!["Stan", "nil"]);
}

flat_record! {
    #[derive(Debug, Default, PartialEq)]
    struct Haul {
        #[flat("ship")]
        ship: String,
        #[flat("chests", custom_list)]
        chests: Vec<Doubloons>,
    }
}

#[tokio::test]
async fn test_custom_list_field() {
    let cancel = CancellationToken::new();
    let data = "ship,chests\nSea Cucumber,\"[5 doubloons,10 doubloons]\"\nJolly Rasta,[]\n";

    let got: Vec<Haul> = unmarshal_to_vec(&cancel, CsvSource::new(data.as_bytes()), Options::strict())
        .await
        .unwrap();
    assert_eq!(got[0].chests, vec![Doubloons(5), Doubloons(10)]);
    assert!(got[1].chests.is_empty());

    let rows: Vec<Vec<String>> = marshal_iter(&cancel, got, Vec::new(), Options::default())
        .await
        .unwrap();
    assert_eq!(rows[1], vec!["Sea Cucumber", "[5 doubloons\\,10 doubloons]"]);
    assert_eq!(rows[2], vec!["Jolly Rasta", "[]"]);

    let data = "ship,chests\nSea Cucumber,\"[5 doubloons,ten]\"\n";
    let err = unmarshal_to_vec::<Haul, _>(&cancel, CsvSource::new(data.as_bytes()), Options::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CustomDecode);
    assert_eq!(err.row(), Some(0));
}
