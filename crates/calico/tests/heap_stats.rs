use calico::{CollectStringPrint, Runner, StrInput};

fn run_stats(source: &str) -> calico::HeapStats {
    let runner = Runner::new(source, "test.cal").unwrap();
    let mut out = CollectStringPrint::new();
    let mut input = StrInput::new("");
    runner.run(&mut out, &mut input).unwrap()
}

#[test]
fn stats_report_live_objects_by_kind() {
    let stats = run_stats("a = [1, 2, 3]; s = \"hi\";");
    assert!(stats.live_objects > 0);
    assert!(stats.total_slots >= stats.live_objects);
    assert!(stats.estimated_bytes > 0);
    // The bound array and string survive to the end of the run.
    assert!(stats.objects_by_kind.get("Array").copied().unwrap_or(0) >= 1);
    assert!(stats.objects_by_kind.get("String").copied().unwrap_or(0) >= 1);
    // Native builtins and method tables are Function values.
    assert!(stats.objects_by_kind.get("Function").copied().unwrap_or(0) > 10);
}

#[test]
fn forced_collection_reclaims_unreachable_values() {
    let source = "
        g = load(\"gc\");
        a = [1, 2, 3];
        a = nothing;
        g.forceping();
    ";
    let stats = run_stats(source);
    assert!(stats.collections >= 1);
    assert_eq!(stats.objects_by_kind.get("Array").copied().unwrap_or(0), 0);
    assert!(stats.free_slots > 0);
}

#[test]
fn stored_values_survive_collection() {
    let source = "
        g = load(\"gc\");
        keep = [1, [2, 3]];
        g.forceping();
        print(keep);
    ";
    let runner = Runner::new(source, "test.cal").unwrap();
    let mut out = CollectStringPrint::new();
    let mut input = StrInput::new("");
    let stats = runner.run(&mut out, &mut input).unwrap();
    assert_eq!(out.output(), "{1, {2, 3}}\n");
    assert!(stats.collections >= 1);
}

#[test]
fn cyclic_garbage_is_reclaimed() {
    // A self-referential array is unreachable after rebinding; mark-sweep
    // must reclaim the cycle.
    let source = "
        g = load(\"gc\");
        a = [1];
        a.append(a);
        a = nothing;
        g.forceping();
    ";
    let stats = run_stats(source);
    assert_eq!(stats.objects_by_kind.get("Array").copied().unwrap_or(0), 0);
}

#[test]
fn allocation_pressure_triggers_automatic_collection() {
    // Enough discarded intermediates to cross the scheduling threshold
    // several times over.
    let source = "
        i = 0;
        while i < 20000 {
            x = [i];
            i = i + 1;
        }
    ";
    let stats = run_stats(source);
    assert!(stats.collections >= 1, "no automatic cycle ran: {stats:?}");
    // The loop's garbage must not accumulate.
    assert!(stats.live_objects < 10000, "heap grew unbounded: {stats:?}");
}

#[test]
fn disabling_collection_suppresses_scheduled_cycles() {
    let source = "
        g = load(\"gc\");
        print(g.status());
        g.disable();
        print(g.status());
        i = 0;
        while i < 20000 {
            x = [i];
            i = i + 1;
        }
        g.enable();
    ";
    let runner = Runner::new(source, "test.cal").unwrap();
    let mut out = CollectStringPrint::new();
    let mut input = StrInput::new("");
    let stats = runner.run(&mut out, &mut input).unwrap();
    assert_eq!(out.output(), "true\nfalse\n");
    assert_eq!(stats.collections, 0);
    assert!(stats.live_objects > 20000);
}
