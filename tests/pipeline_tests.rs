//! Pipeline tests: end-to-end output, composition, slow-digest exclusion, drop accounting, and
//! the generic executor with custom stages.

use crossbeam_channel::bounded;
use signer::engine::{DigestProvider, HashProvider, IdentityProvider, InstrumentedProvider};
use signer::pipeline::{
    CombineStage, MultiHashStage, Pipeline, Signer, SingleHashStage, SlowDigestGate, StageState,
    combine_results, multi_hash, single_hash, stage_fn,
};
use signer::{Item, SignOpts, sign_items};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const IDENTITY_0_1: &str = "00~010~020~030~040~050~0_01~111~121~131~141~151~1";

fn tokens(n: i64) -> Vec<Item> {
    (0..n).map(Item::Int).collect()
}

#[test]
fn test_identity_end_to_end_pins_bytes() -> anyhow::Result<()> {
    let signed = sign_items(
        vec![Item::Int(0), Item::Int(1)],
        Arc::new(IdentityProvider),
        &SignOpts::default(),
    )?;
    assert_eq!(signed.result, IDENTITY_0_1);
    assert!(signed.dropped.is_empty());
    Ok(())
}

#[test]
fn test_identity_text_tokens_match_int_tokens() -> anyhow::Result<()> {
    let signed = sign_items(
        vec![Item::from("1"), Item::from("0")],
        Arc::new(IdentityProvider),
        &SignOpts::default(),
    )?;
    assert_eq!(signed.result, IDENTITY_0_1);
    Ok(())
}

#[test]
fn test_empty_input_yields_empty_string() -> anyhow::Result<()> {
    let signed = sign_items(
        Vec::<Item>::new(),
        Arc::new(DigestProvider),
        &SignOpts::default(),
    )?;
    assert_eq!(signed.result, "");
    let combine = signed.stages.last().unwrap();
    assert_eq!(combine.received, 0);
    assert_eq!(combine.emitted, 1);
    Ok(())
}

#[test]
fn test_composition_law() -> anyhow::Result<()> {
    let inputs: Vec<Item> = (0..25)
        .map(|i| match i % 3 {
            0 => Item::Int(i),
            1 => Item::Uint(i as u64 * 1_000),
            _ => Item::Text(format!("tok-{i}")),
        })
        .collect();

    let signer = Signer::new(Arc::new(DigestProvider));
    let expected = combine_results(
        inputs
            .iter()
            .map(|item| {
                let token = item.to_token().unwrap();
                multi_hash(&signer, &single_hash(&signer, &token))
            })
            .collect(),
    );

    let signed = sign_items(inputs, Arc::new(DigestProvider), &SignOpts::default())?;
    assert_eq!(signed.result, expected);
    Ok(())
}

#[test]
fn test_repeated_runs_are_byte_identical() -> anyhow::Result<()> {
    let first = sign_items(tokens(30), Arc::new(DigestProvider), &SignOpts::default())?;
    let mut reversed = tokens(30);
    reversed.reverse();
    let second = sign_items(reversed, Arc::new(DigestProvider), &SignOpts::default())?;
    assert_eq!(first.result, second.result);
    Ok(())
}

#[test]
fn test_slow_digest_never_overlaps_under_load() -> anyhow::Result<()> {
    let provider = Arc::new(
        InstrumentedProvider::new(DigestProvider)
            .with_delays(Duration::ZERO, Duration::from_millis(2)),
    );
    let gate = Arc::new(SlowDigestGate::new());
    let pipeline = Pipeline::signer(Arc::clone(&provider) as Arc<dyn HashProvider>)
        .with_gate(Arc::clone(&gate));

    let outcome = pipeline.run(tokens(100))?;
    assert_eq!(outcome.outputs.len(), 1);

    let stats = provider.stats();
    assert_eq!(stats.slow_calls, 100);
    assert_eq!(stats.max_slow_in_flight, 1);
    assert_eq!(stats.slow_overlaps, 0);
    // one fast for the token, one over the slow result, six in multi hash
    assert_eq!(stats.fast_calls, 100 * 8);
    assert_eq!(gate.acquisitions(), 100);
    Ok(())
}

#[test]
fn test_large_batch_completes_with_gate_held_one_at_a_time() -> anyhow::Result<()> {
    let n = 20_000;
    let provider = Arc::new(
        InstrumentedProvider::new(IdentityProvider)
            .with_delays(Duration::ZERO, Duration::from_micros(200)),
    );
    let signed = sign_items(
        tokens(n),
        Arc::clone(&provider) as Arc<dyn HashProvider>,
        &SignOpts::default(),
    )?;

    assert_eq!(signed.result.split('_').count(), n as usize);
    assert!(signed.dropped.is_empty());
    for report in &signed.stages[..2] {
        assert_eq!(report.received, n as usize, "{}", report.name);
        assert_eq!(report.emitted, n as usize, "{}", report.name);
    }
    let stats = provider.stats();
    assert_eq!(stats.slow_calls, n as usize);
    assert_eq!(stats.max_slow_in_flight, 1);
    assert_eq!(stats.slow_overlaps, 0);
    Ok(())
}

#[test]
fn test_worker_cap_bounds_live_workers() -> anyhow::Result<()> {
    let live = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (live_w, peak_w) = (Arc::clone(&live), Arc::clone(&peak));
    let tracked = stage_fn("tracked", move |input, output, ctx| {
        ctx.spawn_per_item(input, output, |item| {
            let now = live_w.fetch_add(1, Ordering::SeqCst) + 1;
            peak_w.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            live_w.fetch_sub(1, Ordering::SeqCst);
            Ok(item.clone())
        });
    });

    let outcome = Pipeline::new(Arc::new(IdentityProvider))
        .stage(tracked)
        .worker_cap(4)
        .run(tokens(50))?;
    assert_eq!(outcome.outputs.len(), 50);
    assert_eq!(outcome.stages[0].emitted, 50);
    let peak = peak.load(Ordering::SeqCst);
    assert!((1..=4).contains(&peak), "peak {peak}");
    assert_eq!(live.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn test_fan_out_runs_fast_digests_concurrently() -> anyhow::Result<()> {
    // Serial execution would take 10 items * 8 fast calls * 100ms = 8s.
    let provider = InstrumentedProvider::new(IdentityProvider)
        .with_delays(Duration::from_millis(100), Duration::ZERO);
    let start = Instant::now();
    let signed = sign_items(tokens(10), Arc::new(provider), &SignOpts::default())?;
    assert!(
        start.elapsed() < Duration::from_secs(3),
        "took {:?}",
        start.elapsed()
    );
    assert_eq!(signed.result.split('_').count(), 10);
    Ok(())
}

#[test]
fn test_every_item_reaches_each_stage_once() -> anyhow::Result<()> {
    let n = 200;
    let outcome = Pipeline::new(Arc::new(IdentityProvider))
        .stage(SingleHashStage)
        .stage(MultiHashStage)
        .channel_cap(0)
        .run(tokens(n))?;

    let mut outputs: Vec<String> = outcome
        .outputs
        .into_iter()
        .map(|i| i.into_text().unwrap())
        .collect();
    outputs.sort();
    let mut expected: Vec<String> = (0..n)
        .map(|i| {
            let s = format!("{i}~{i}");
            (0..6).map(|k| format!("{k}{s}")).collect::<String>()
        })
        .collect();
    expected.sort();
    assert_eq!(outputs, expected);

    for report in &outcome.stages {
        assert_eq!(report.received, n as usize, "{}", report.name);
        assert_eq!(report.emitted, n as usize, "{}", report.name);
        assert_eq!(report.dropped, 0, "{}", report.name);
    }
    Ok(())
}

#[test]
fn test_conversion_failures_are_dropped_and_surfaced() -> anyhow::Result<()> {
    let items = vec![
        Item::Int(0),
        Item::Float(0.5),
        Item::Bytes(vec![0xc3, 0x28]),
        Item::Bytes(b"1".to_vec()),
    ];
    let signed = sign_items(items, Arc::new(IdentityProvider), &SignOpts::default())?;
    assert_eq!(signed.result, IDENTITY_0_1);

    assert_eq!(signed.dropped.len(), 2);
    assert!(signed.dropped.iter().all(|d| d.stage == "single_hash"));
    assert!(signed.dropped.iter().any(|d| d.item == Item::Float(0.5)));

    let single = &signed.stages[0];
    assert_eq!(
        (single.received, single.emitted, single.dropped),
        (4, 2, 2)
    );
    let multi = &signed.stages[1];
    assert_eq!((multi.received, multi.emitted, multi.dropped), (2, 2, 0));
    let combine = &signed.stages[2];
    assert_eq!(
        (combine.received, combine.emitted, combine.dropped),
        (2, 1, 0)
    );
    Ok(())
}

#[test]
fn test_strict_mode_fails_after_drain() {
    let opts = SignOpts {
        strict: true,
        ..SignOpts::default()
    };
    let err = sign_items(
        vec![Item::Int(1), Item::Float(1.0)],
        Arc::new(IdentityProvider),
        &opts,
    )
    .unwrap_err();
    assert!(err.to_string().contains("strict mode"));
}

#[test]
fn test_multi_and_combine_reject_non_text() -> anyhow::Result<()> {
    let outcome = Pipeline::new(Arc::new(IdentityProvider))
        .stage(MultiHashStage)
        .run(vec![Item::Int(3), Item::from("x")])?;
    assert_eq!(outcome.outputs, vec![Item::from("0x1x2x3x4x5x")]);
    assert_eq!(outcome.dropped.len(), 1);
    assert_eq!(outcome.dropped[0].stage, "multi_hash");
    assert_eq!(outcome.dropped[0].item, Item::Int(3));

    let outcome = Pipeline::new(Arc::new(IdentityProvider))
        .stage(CombineStage)
        .run(vec![Item::from("b"), Item::Uint(9), Item::from("a")])?;
    assert_eq!(outcome.outputs, vec![Item::from("a_b")]);
    assert_eq!(outcome.dropped[0].stage, "combine");
    Ok(())
}

// --- generic executor ---

#[test]
fn test_zero_stage_pipeline_passes_input_through() -> anyhow::Result<()> {
    let outcome = Pipeline::new(Arc::new(IdentityProvider)).run(tokens(5))?;
    assert_eq!(outcome.outputs, tokens(5));
    assert!(outcome.stages.is_empty());
    Ok(())
}

#[test]
fn test_custom_stages_compose_with_builtin() -> anyhow::Result<()> {
    let double = stage_fn("double", |input, output, ctx| {
        for item in input.iter() {
            ctx.record_received();
            match item {
                Item::Int(n) => {
                    ctx.emit(output, Item::Int(n * 2));
                }
                other => {
                    let err = other.unsupported("int");
                    ctx.drop_item(other, err);
                }
            }
        }
    });
    let stringify = stage_fn("stringify", |input, output, ctx| {
        ctx.spawn_per_item(input, output, |item| Ok(Item::Text(item.to_token()?)));
    });

    let pipeline = Pipeline::new(Arc::new(IdentityProvider))
        .stage(double)
        .stage(stringify)
        .stage(CombineStage);
    assert_eq!(
        pipeline.stage_names(),
        vec!["double", "stringify", "combine"]
    );

    let outcome = pipeline.run(vec![Item::Int(3), Item::Int(1), Item::from("no"), Item::Int(2)])?;
    assert_eq!(outcome.outputs, vec![Item::from("2_4_6")]);
    assert_eq!(outcome.dropped.len(), 1);
    assert_eq!(outcome.dropped[0].stage, "double");
    Ok(())
}

#[test]
fn test_streaming_spawn_and_stage_states() -> anyhow::Result<()> {
    let pipeline = Pipeline::signer(Arc::new(IdentityProvider));
    let (input_tx, input_rx) = bounded::<Item>(4);
    let handles = pipeline.spawn(input_rx)?;

    for stage in &handles.stages {
        assert!(stage.state() < StageState::Closed);
    }
    input_tx.send(Item::Int(1))?;
    input_tx.send(Item::Int(0))?;
    drop(input_tx);

    let out: Vec<Item> = handles.output_rx.iter().collect();
    assert_eq!(out, vec![Item::from(IDENTITY_0_1)]);

    let stages = handles.stages.clone();
    let (reports, dropped) = handles.finish()?;
    assert!(dropped.is_empty());
    assert_eq!(reports.len(), 3);
    for stage in &stages {
        assert_eq!(stage.state(), StageState::Closed);
    }
    Ok(())
}

#[test]
fn test_finish_without_draining_does_not_hang() -> anyhow::Result<()> {
    let pipeline = Pipeline::new(Arc::new(IdentityProvider))
        .stage(SingleHashStage)
        .channel_cap(0);
    let (input_tx, input_rx) = bounded::<Item>(16);
    let handles = pipeline.spawn(input_rx)?;
    for item in tokens(10) {
        input_tx.send(item)?;
    }
    drop(input_tx);

    let (reports, _) = handles.finish()?;
    assert_eq!(reports[0].received, 10);
    assert_eq!(reports[0].emitted, 0);
    Ok(())
}

#[test]
fn test_shared_gate_across_runs() -> anyhow::Result<()> {
    let gate = Arc::new(SlowDigestGate::new());
    let pipeline = Pipeline::signer(Arc::new(DigestProvider)).with_gate(Arc::clone(&gate));
    pipeline.run(tokens(3))?;
    pipeline.run(tokens(4))?;
    assert_eq!(gate.acquisitions(), 7);
    Ok(())
}
