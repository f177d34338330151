//! Clause grammar and rule data tests.
//!
//! The clause DSL is the persisted wire format for rule sets: the same
//! text must parse to the same behavior across runs. These tests
//! exercise the grammar end to end through serde_json rule data and
//! spot-check evaluation semantics at the clause level.

use cardscript::{
    Command, CardData, ConditionNode, EvalContext, FieldData, Getter, Match, MatchRng, Rule,
    RuleData, Selector, TickStatus, Value, VariableStore, ZoneData,
};

fn fixture() -> (cardscript::Game, VariableStore, MatchRng) {
    let mut game = cardscript::Game::new();
    let deck = game.add_zone(&ZoneData {
        name: "Deck".into(),
        tags: vec!["Deck".into()],
    });
    for i in 0..4 {
        let id = game.add_card(&CardData {
            name: format!("Card{i}"),
            tags: vec!["Unit".into()],
            fields: vec![FieldData {
                name: "Cost".into(),
                value: format!("{i}"),
                kind: None,
            }],
            zone: None,
        });
        game.move_card(&id, &deck, cardscript::ZonePlacement::Top);
    }
    (game, VariableStore::new(), MatchRng::new(0))
}

/// Rule data survives a serde_json round trip and parses to the same
/// commands.
#[test]
fn test_rule_data_round_trip() {
    let original = RuleData {
        name: "Draw one".into(),
        tags: vec!["Core".into()],
        origin: "match".into(),
        trigger: "OnPhaseStarted".into(),
        condition: "phase=Draw&nc(z:Hand)<7".into(),
        commands: "MoveCardToZone(c(z:Deck,x:1),z:Hand);EndCurrentPhase".into(),
        else_commands: "SendMessage(HandFull)".into(),
    };
    let json = serde_json::to_string(&original).unwrap();
    let restored: RuleData = serde_json::from_str(&json).unwrap();

    let a = Rule::from_data(&original).unwrap();
    let b = Rule::from_data(&restored).unwrap();
    assert_eq!(a.trigger, b.trigger);
    assert_eq!(a.commands.len(), b.commands.len());
    for (x, y) in a.commands.iter().zip(&b.commands) {
        assert_eq!(x.structural_hash(), y.structural_hash());
    }
    assert_eq!(a.else_commands[0].verb(), "SendMessage");
}

/// Missing optional fields default rather than failing to parse.
#[test]
fn test_rule_data_defaults() {
    let data: RuleData = serde_json::from_str(
        r#"{"name":"Minimal","trigger":"OnTurnStarted","commands":"EndCurrentPhase"}"#,
    )
    .unwrap();
    let rule = Rule::from_data(&data).unwrap();
    assert!(rule.condition.is_none());
    assert!(rule.else_commands.is_empty());
    assert!(rule.tags.is_empty());
}

/// A full setup deserializes from JSON and runs.
#[test]
fn test_setup_from_json() {
    let json = r#"{
        "seed": 3,
        "phases": ["Draw"],
        "zones": [
            {"name": "Deck", "tags": ["Deck"]},
            {"name": "Hand", "tags": ["Hand"]}
        ],
        "cards": [
            {"name": "Ace", "zone": "Deck"},
            {"name": "King", "zone": "Deck"}
        ],
        "rules": [{
            "name": "Draw one",
            "trigger": "OnPhaseStarted",
            "condition": "phase=Draw",
            "commands": "MoveCardToZone(c(z:Deck,x:1),z:Hand)"
        }]
    }"#;
    let setup: cardscript::MatchSetup = serde_json::from_str(json).unwrap();
    let mut game = Match::new(&setup);
    assert_eq!(game.settle(200), TickStatus::Idle);
    assert_eq!(game.game().find_zone("Hand").unwrap().len(), 1);
}

/// Boolean composition at the clause level.
#[test]
fn test_condition_composition() {
    let (game, vars, mut rng) = fixture();
    let mut ctx = EvalContext::new(&game, &vars, &mut rng);
    let cases = [
        ("1=1&2=2", true),
        ("1=1&2=3", false),
        ("1=2|(2=2&3=3)", true),
        ("!(1=1)|1=2", false),
        ("!(1=2)&!(2=3)", true),
    ];
    for (clause, expected) in cases {
        let tree = ConditionNode::parse(clause).unwrap();
        assert_eq!(tree.evaluate(&mut ctx), expected, "{clause}");
    }
}

/// Selector defaults: no filters means the whole pool in pool order;
/// a cap bounds the result exactly.
#[test]
fn test_selector_defaults_and_caps() {
    let (game, vars, mut rng) = fixture();
    let mut ctx = EvalContext::new(&game, &vars, &mut rng);

    let all = Selector::parse("allcards").unwrap().cards(&mut ctx);
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].as_str(), "c0001");

    let capped = Selector::parse("c(z:Deck,x:2)").unwrap().cards(&mut ctx);
    assert_eq!(capped.len(), 2);

    let over = Selector::parse("c(z:Deck,x:99)").unwrap().cards(&mut ctx);
    assert_eq!(over.len(), 4);
}

/// Arithmetic precedence through the getter grammar.
#[test]
fn test_getter_precedence() {
    let (game, vars, mut rng) = fixture();
    let mut ctx = EvalContext::new(&game, &vars, &mut rng);
    assert_eq!(
        Getter::parse("2+3*4").unwrap().get(&mut ctx),
        Value::Number(14.0)
    );
    assert_eq!(
        Getter::parse("(2+3)*4").unwrap().get(&mut ctx),
        Value::Number(20.0)
    );
    // Getters can mix selection counts into arithmetic.
    assert_eq!(
        Getter::parse("nc(z:Deck)*10+nc(t:Unit)").unwrap().get(&mut ctx),
        Value::Number(44.0)
    );
}

/// Reserved variable names reject external writes at the store level.
#[test]
fn test_reserved_variables() {
    let mut vars = VariableStore::new();
    assert!(vars.set("score", "10"));
    assert!(!vars.set("turnNumber", "99"));
    assert!(!vars.set("movedCard", "c0001"));
    assert_eq!(vars.get("turnNumber"), None);
    assert!(cardscript::is_reserved("phase"));
    // Reserved even though no engine path writes it yet.
    assert!(cardscript::is_reserved("additionalInfo"));
    assert!(!cardscript::is_reserved("score"));
}

/// Ill-formed clauses are errors at parse time, not surprises later.
#[test]
fn test_parse_failures_are_contained() {
    assert!(Command::parse("Fly(c0001)").is_err());
    assert!(Selector::parse("c(z:Deck").is_err());
    assert!(ConditionNode::parse("1=1&").is_err());
    assert!(Getter::parse("2+*3").is_err());
}
