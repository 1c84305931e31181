use super::*;

use shared::domain::DEFAULT_FONT_SIZE;

fn filled_controller() -> (FormController, SelectionId) {
    let mut controller = FormController::default();
    let id = controller
        .select_image(Some(PathBuf::from("/tmp/photos/cat.png")))
        .expect("selection id");
    assert!(controller.preview_loaded(id));
    controller.fields_mut().wishes_text = "Happy Birthday".to_string();
    controller.fields_mut().name_text = "Jane Doe ".to_string();
    (controller, id)
}

fn dispatch(controller: &mut FormController) -> CardDraft {
    match controller.begin_submit() {
        SubmitStart::Dispatch(draft) => draft,
        other => panic!("expected dispatch, got {other:?}"),
    }
}

#[test]
fn idle_view_shows_only_generate() {
    let controller = FormController::default();
    assert_eq!(
        controller.view(),
        ViewState {
            preview_visible: false,
            loading_visible: false,
            output_visible: false,
            download_visible: false,
            generate_visible: true,
            regenerate_visible: false,
            triggers_enabled: true,
        }
    );
}

#[test]
fn missing_image_blocks_dispatch() {
    let mut controller = FormController::default();
    controller.fields_mut().wishes_text = "Happy Birthday".to_string();
    controller.fields_mut().name_text = "Jane".to_string();

    assert_eq!(
        controller.begin_submit(),
        SubmitStart::Rejected(ValidationError::MissingImage)
    );
    assert_eq!(
        controller.current_alert(),
        Some("Oops! Please upload an image first.")
    );
    assert_eq!(controller.state(), RequestState::Idle);
}

#[test]
fn whitespace_wishes_text_blocks_dispatch() {
    let (mut controller, _) = filled_controller();
    controller.fields_mut().wishes_text = "  \t ".to_string();

    assert_eq!(
        controller.begin_submit(),
        SubmitStart::Rejected(ValidationError::MissingWishesText)
    );
    assert_eq!(
        controller.current_alert(),
        Some("Please enter some wishes text (e.g., Happy Birthday).")
    );
    assert!(controller.view().triggers_enabled);
    assert!(!controller.view().loading_visible);
}

#[test]
fn empty_name_blocks_dispatch() {
    let (mut controller, _) = filled_controller();
    controller.fields_mut().name_text.clear();

    assert_eq!(
        controller.begin_submit(),
        SubmitStart::Rejected(ValidationError::MissingNameText)
    );
    assert_eq!(
        controller.current_alert(),
        Some("Who is this card for? Please enter a name.")
    );
}

#[test]
fn dispatch_shows_loading_and_disables_triggers() {
    let (mut controller, _) = filled_controller();
    let draft = dispatch(&mut controller);

    assert_eq!(draft.image.file_name, "cat.png");
    assert_eq!(draft.fields.name_text, "Jane Doe ");
    let view = controller.view();
    assert!(view.loading_visible);
    assert!(!view.output_visible);
    assert!(!view.download_visible);
    assert!(!view.triggers_enabled);
    assert!(view.generate_visible);
    assert_eq!(controller.begin_submit(), SubmitStart::Busy);
}

#[test]
fn success_shows_result_and_swaps_triggers() {
    let (mut controller, _) = filled_controller();
    let draft = dispatch(&mut controller);

    let completion = controller.finish_submit(draft.request_id, Ok(vec![0xFF, 0xD8, 0xFF]));
    let Completion::Succeeded(result_id) = completion else {
        panic!("expected success, got {completion:?}");
    };

    let result = controller.result().expect("result");
    assert_eq!(result.id, result_id);
    assert_eq!(result.download_name, "jane_doe_card.jpg");
    assert_eq!(
        controller.view(),
        ViewState {
            preview_visible: true,
            loading_visible: false,
            output_visible: true,
            download_visible: true,
            generate_visible: false,
            regenerate_visible: true,
            triggers_enabled: true,
        }
    );
    assert_eq!(controller.current_alert(), None);
}

#[test]
fn server_reported_failure_reshows_generate() {
    let (mut controller, _) = filled_controller();
    let draft = dispatch(&mut controller);

    let completion = controller.finish_submit(
        draft.request_id,
        Err(SubmitError::ServerReported {
            status: 400,
            message: "bad image".to_string(),
        }),
    );

    assert_eq!(
        completion,
        Completion::Failed {
            alert: "Failed to create card: bad image".to_string()
        }
    );
    let view = controller.view();
    assert!(view.generate_visible);
    assert!(!view.regenerate_visible);
    assert!(!view.loading_visible);
    assert!(view.triggers_enabled);
    assert!(controller
        .current_alert()
        .is_some_and(|alert| alert.ends_with("bad image")));
}

#[test]
fn failed_regenerate_keeps_regenerate_visible() {
    let (mut controller, _) = filled_controller();
    let first = dispatch(&mut controller);
    controller.finish_submit(first.request_id, Ok(vec![1]));

    let second = dispatch(&mut controller);
    assert!(controller.result().is_none());
    controller.finish_submit(second.request_id, Err(SubmitError::Server { status: 500 }));

    let view = controller.view();
    assert!(view.regenerate_visible);
    assert!(!view.generate_visible);
    assert!(!view.output_visible);
    assert!(!view.download_visible);
    assert!(view.triggers_enabled);
    assert_eq!(
        controller.current_alert(),
        Some("Failed to create card: Image processing failed. Status: 500")
    );
}

#[test]
fn regenerate_supersedes_previous_result() {
    let (mut controller, _) = filled_controller();
    let first = dispatch(&mut controller);
    let Completion::Succeeded(first_id) = controller.finish_submit(first.request_id, Ok(vec![1]))
    else {
        panic!("first cycle failed");
    };

    let second = dispatch(&mut controller);
    let Completion::Succeeded(second_id) =
        controller.finish_submit(second.request_id, Ok(vec![2]))
    else {
        panic!("second cycle failed");
    };

    assert_ne!(first_id, second_id);
    let result = controller.result().expect("result");
    assert_eq!(result.id, second_id);
    assert_eq!(result.bytes, vec![2]);
}

#[test]
fn new_selection_resets_result_view_after_any_number_of_cycles() {
    let (mut controller, _) = filled_controller();
    for _ in 0..3 {
        let draft = dispatch(&mut controller);
        controller.finish_submit(draft.request_id, Ok(vec![7]));
    }

    let id = controller.select_image(Some(PathBuf::from("dog.jpg")));
    assert!(id.is_some());
    assert!(controller.result().is_none());

    let view = controller.view();
    assert!(!view.output_visible);
    assert!(!view.download_visible);
    assert!(!view.regenerate_visible);
    assert!(view.generate_visible);
    assert!(view.triggers_enabled);
}

#[test]
fn stale_completion_is_ignored() {
    let (mut controller, _) = filled_controller();
    let draft = dispatch(&mut controller);
    controller.finish_submit(draft.request_id, Ok(vec![1]));

    assert_eq!(
        controller.finish_submit(draft.request_id, Err(SubmitError::network("late"))),
        Completion::Stale
    );
    assert_eq!(controller.state(), RequestState::Success);
    assert_eq!(controller.current_alert(), None);
}

#[test]
fn selecting_during_flight_keeps_triggers_disabled() {
    let (mut controller, _) = filled_controller();
    let first = dispatch(&mut controller);
    controller.finish_submit(first.request_id, Ok(vec![1]));
    let second = dispatch(&mut controller);

    controller.select_image(Some(PathBuf::from("other.png")));
    let view = controller.view();
    assert!(!view.triggers_enabled);
    assert!(view.generate_visible);
    assert_eq!(controller.begin_submit(), SubmitStart::Busy);

    controller.finish_submit(second.request_id, Ok(vec![3]));
    assert!(controller.view().triggers_enabled);
}

#[test]
fn stale_preview_is_dropped() {
    let mut controller = FormController::default();
    let first = controller
        .select_image(Some(PathBuf::from("a.png")))
        .expect("first");
    let second = controller
        .select_image(Some(PathBuf::from("b.png")))
        .expect("second");

    assert!(!controller.preview_loaded(first));
    assert!(!controller.view().preview_visible);
    assert!(controller.preview_loaded(second));
    assert!(controller.view().preview_visible);
}

#[test]
fn preview_failure_clears_selection_and_alerts() {
    let mut controller = FormController::default();
    let id = controller
        .select_image(Some(PathBuf::from("broken.png")))
        .expect("selection");

    assert!(controller.preview_failed(id, "permission denied"));
    assert!(controller.selection().is_none());
    assert!(!controller.view().preview_visible);
    assert_eq!(
        controller.current_alert(),
        Some("Could not read the selected image: permission denied")
    );

    controller.dismiss_alert();
    controller.fields_mut().wishes_text = "Hi".to_string();
    controller.fields_mut().name_text = "Bo".to_string();
    assert_eq!(
        controller.begin_submit(),
        SubmitStart::Rejected(ValidationError::MissingImage)
    );
}

#[test]
fn cancelled_selection_hides_preview() {
    let (mut controller, _) = filled_controller();
    assert!(controller.view().preview_visible);

    assert_eq!(controller.select_image(None), None);
    assert!(!controller.view().preview_visible);
    assert!(controller.selection().is_none());
}

#[test]
fn slider_readout_mirrors_literal_value() {
    let mut controller = FormController::default();
    assert_eq!(
        controller.font_readout(FontSlider::Wishes),
        DEFAULT_FONT_SIZE.to_string()
    );

    controller.set_font_size(FontSlider::Wishes, 137);
    controller.set_font_size(FontSlider::Name, 42);
    assert_eq!(controller.font_readout(FontSlider::Wishes), "137");
    assert_eq!(controller.font_readout(FontSlider::Name), "42");

    let (mut busy, _) = filled_controller();
    dispatch(&mut busy);
    busy.set_font_size(FontSlider::Name, 55);
    assert_eq!(busy.font_readout(FontSlider::Name), "55");
}

#[test]
fn alerts_queue_until_dismissed() {
    let mut controller = FormController::default();
    controller.begin_submit();
    controller.raise_alert("second");

    assert_eq!(
        controller.current_alert(),
        Some("Oops! Please upload an image first.")
    );
    controller.dismiss_alert();
    assert_eq!(controller.current_alert(), Some("second"));
    controller.dismiss_alert();
    assert_eq!(controller.current_alert(), None);
}

#[test]
fn validating_view_mirrors_origin_with_triggers_disabled() {
    let view = RequestState::Validating {
        from: Settled::Success,
    }
    .view();
    assert!(view.output_visible);
    assert!(view.regenerate_visible);
    assert!(!view.triggers_enabled);
}

#[test]
fn rejected_pick_resets_result_view() {
    let (mut controller, _) = filled_controller();
    let draft = dispatch(&mut controller);
    controller.finish_submit(draft.request_id, Ok(vec![1]));
    assert!(controller.view().regenerate_visible);

    controller.reject_selection("notes.txt is not a supported image type.");

    assert!(controller.selection().is_none());
    assert!(controller.result().is_none());
    assert_eq!(controller.state(), RequestState::Idle);
    let view = controller.view();
    assert!(!view.preview_visible && !view.output_visible && !view.download_visible);
    assert!(view.generate_visible && !view.regenerate_visible && view.triggers_enabled);
    assert_eq!(
        controller.current_alert(),
        Some("notes.txt is not a supported image type.")
    );
    assert_eq!(
        controller.begin_submit(),
        SubmitStart::Rejected(ValidationError::MissingImage)
    );
}
