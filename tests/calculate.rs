use rosu_solve::{
    convert_beatmap_to_actions, Beatmap, MapAttributes, Modifiers, PPCalculator, PPIter,
    ScoreCounts, Skills, SKILL_COUNT,
};

const SHORT_MAP: &str = "osu file format v14

[General]
Mode: 0

[Difficulty]
HPDrainRate:5
CircleSize:4
OverallDifficulty:8
ApproachRate:9
SliderMultiplier:1.4
SliderTickRate:1

[TimingPoints]
0,500,4,2,0,100,1,0

[HitObjects]
100,100,1000,1,0,0:0:0:0:
200,150,2000,12,0,3000,0:0:0:0:
";

const JUMPY_MAP: &str = "osu file format v14

[Difficulty]
HPDrainRate:5
CircleSize:5
OverallDifficulty:9
ApproachRate:9.6
SliderMultiplier:1.4
SliderTickRate:1

[TimingPoints]
0,400,4,2,0,100,1,0

[HitObjects]
64,64,1000,1,0,0:0:0:0:
448,320,1200,1,0,0:0:0:0:
64,320,1400,1,0,0:0:0:0:
448,64,1600,1,0,0:0:0:0:
256,192,1800,1,0,0:0:0:0:
64,64,2000,1,0,0:0:0:0:
";

fn decode(data: &str) -> Beatmap {
    Beatmap::from_bytes(data.as_bytes()).unwrap()
}

/// Evaluates a fixed skill vector against a map, without solving.
fn probability_at(map: &Beatmap, mods: Modifiers, skills: Skills, counts: ScoreCounts) -> f64 {
    let attrs = MapAttributes::new(map, &mods);
    let actions = convert_beatmap_to_actions(map, &attrs).unwrap();

    let mut iter = PPIter::new(skills, attrs);

    for action in &actions {
        iter.iterate_action(action);
    }

    iter.calculate_probability(&counts);

    iter.prob_result
}

#[test]
fn trivial_lazer_score_solves() {
    let map = decode(SHORT_MAP);

    let info = PPCalculator::new(&map)
        .mods(Modifiers {
            lazer: true,
            ..Default::default()
        })
        .calculate()
        .unwrap();

    assert!(info.probability() >= 0.1 - 1e-5);
    assert!(info.pp().is_finite());
    assert!(info.pp() > 0.0);

    // every solved component respects the lower clamp
    for component in info.skills().to_vector() {
        assert!(component >= 1.0);
    }
}

#[test]
fn allowed_mistakes_never_cost_more_pp() {
    let map = decode(JUMPY_MAP);

    let perfect = PPCalculator::new(&map).calculate().unwrap();

    let sloppy = PPCalculator::new(&map)
        .counts(ScoreCounts {
            n100: 2,
            misses: 1,
            ..Default::default()
        })
        .calculate()
        .unwrap();

    assert!(sloppy.pp() <= perfect.pp() + 1e-6);
}

#[test]
fn faster_rate_does_not_lower_pp() {
    let map = decode(JUMPY_MAP);

    let nomod = PPCalculator::new(&map).calculate().unwrap();

    let doubletime = PPCalculator::new(&map)
        .mods(Modifiers {
            rate: Modifiers::DOUBLE_TIME_RATE,
            ..Default::default()
        })
        .calculate()
        .unwrap();

    assert!(doubletime.pp() >= nomod.pp() - 1e-6);
}

#[test]
fn easy_and_hardrock_shift_the_probability() {
    let map = decode(JUMPY_MAP);
    let skills = Skills::from_vector([500.0; SKILL_COUNT]);
    let counts = ScoreCounts::default();

    let nomod = probability_at(&map, Modifiers::default(), skills, counts);
    let easy = probability_at(
        &map,
        Modifiers {
            easy: true,
            ..Default::default()
        },
        skills,
        counts,
    );
    let hardrock = probability_at(
        &map,
        Modifiers {
            hardrock: true,
            ..Default::default()
        },
        skills,
        counts,
    );

    assert!(easy >= nomod, "easy {easy} < nomod {nomod}");
    assert!(hardrock <= nomod, "hardrock {hardrock} > nomod {nomod}");
}

#[test]
fn stable_and_lazer_disagree_on_sliders() {
    let map = decode(
        "osu file format v14

[Difficulty]
HPDrainRate:5
CircleSize:4
OverallDifficulty:8
ApproachRate:9
SliderMultiplier:1
SliderTickRate:1

[TimingPoints]
0,500,4,2,0,100,1,0

[HitObjects]
256,192,1000,2,0,L|456:192,1,200,0|0,0:0|0:0,0:0:0:0:
",
    );

    let skills = Skills::from_vector([200.0; SKILL_COUNT]);
    let counts = ScoreCounts::default();

    let stable = probability_at(&map, Modifiers::default(), skills, counts);
    let lazer = probability_at(
        &map,
        Modifiers {
            lazer: true,
            ..Default::default()
        },
        skills,
        counts,
    );

    // both judge the same slider, just under different accounting
    assert!(stable > 0.0);
    assert!(lazer > 0.0);
    assert!((stable - lazer).abs() > 1e-12);
}

#[test]
fn reported_difficulty_matches_the_windows() {
    let map = decode(SHORT_MAP);

    let info = PPCalculator::new(&map).calculate().unwrap();

    assert!((info.overall_difficulty - 8.0).abs() < 1e-9);
    assert!((info.overall_difficulty_100s - 8.0).abs() < 1e-9);
    assert!((info.overall_difficulty_50s - 8.0).abs() < 1e-9);
    assert!((info.approach_rate - 9.0).abs() < 1e-9);

    let doubled = PPCalculator::new(&map)
        .mods(Modifiers {
            rate: Modifiers::DOUBLE_TIME_RATE,
            ..Default::default()
        })
        .calculate()
        .unwrap();

    // rate-scaled windows read as a harder od/ar
    assert!(doubled.overall_difficulty > 8.0);
    assert!(doubled.approach_rate > 9.0);
}

#[test]
fn spun_out_removes_spinner_risk() {
    let map = decode(SHORT_MAP);
    let skills = Skills::from_vector([300.0; SKILL_COUNT]);

    let with_spinner = probability_at(&map, Modifiers::default(), skills, ScoreCounts::default());
    let spun_out = probability_at(
        &map,
        Modifiers {
            spun_out: true,
            ..Default::default()
        },
        skills,
        ScoreCounts::default(),
    );

    assert!(spun_out >= with_spinner);
}

#[test]
fn serialises_for_the_caller() {
    let map = decode(SHORT_MAP);

    let info = PPCalculator::new(&map)
        .mods(Modifiers {
            lazer: true,
            ..Default::default()
        })
        .calculate()
        .unwrap();

    let json = serde_json::to_string(&info).unwrap();

    assert!(json.contains("\"pp\""));
    assert!(json.contains("\"prob_result\""));
}
