use archiver_logging::{get_scroll_step, set_scroll_step};

#[test]
fn step_counter_round_trips_on_one_thread() {
    set_scroll_step(17);
    assert_eq!(get_scroll_step(), 17);
}

#[test]
fn step_counter_is_per_thread() {
    set_scroll_step(5);
    let seen_elsewhere = std::thread::spawn(get_scroll_step).join().unwrap();
    assert_eq!(seen_elsewhere, 0);
    assert_eq!(get_scroll_step(), 5);
}
