//! Grid canvas: frame loop, resize handling and input listeners.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bastion_core::config::TILE_SIZE;
use bastion_core::viewport::backing_size;
use bastion_core::{InputEvent, PointerButton, SessionMsg, TileSheet, draw_frame};
use gloo::events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Element, HtmlCanvasElement, HtmlImageElement, HtmlInputElement, KeyboardEvent, MouseEvent,
    ResizeObserver, WheelEvent,
};
use yew::prelude::*;

use crate::canvas_surface::{CanvasSurface, apply_backing_size, context_2d};
use crate::config::TILE_SHEET_URL;
use crate::hooks::EditorHandle;

#[derive(Properties, PartialEq)]
pub struct MapCanvasProps {
    pub handle: EditorHandle,
}

/// Mouse position relative to the canvas, in CSS pixels.
fn canvas_point(canvas: &HtmlCanvasElement, event: &MouseEvent) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    (
        f64::from(event.client_x()) - rect.left(),
        f64::from(event.client_y()) - rect.top(),
    )
}

/// Re-read the container size and resize the backing store to match.
fn sync_canvas_size(
    container: &Element,
    canvas: &HtmlCanvasElement,
    context: &web_sys::CanvasRenderingContext2d,
    handle: &EditorHandle,
) {
    let rect = container.get_bounding_client_rect();
    let (width, height) = (rect.width(), rect.height());
    let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
    apply_backing_size(canvas, context, backing_size((width, height), dpr), dpr);
    handle.dispatch(SessionMsg::Resize {
        width,
        height,
        device_pixel_ratio: dpr,
    });
}

fn input_listeners(canvas: &HtmlCanvasElement, handle: &EditorHandle) -> Vec<EventListener> {
    let mut listeners = Vec::new();
    let blocking = EventListenerOptions::enable_prevent_default();

    let pointer = |name: &'static str, make: fn(&HtmlCanvasElement, &MouseEvent) -> InputEvent| {
        let canvas_for_event = canvas.clone();
        let handle = handle.clone();
        EventListener::new(canvas, name, move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                handle.dispatch(SessionMsg::Input(make(&canvas_for_event, event)));
            }
        })
    };

    listeners.push(pointer("mousemove", |canvas, e| {
        let (x, y) = canvas_point(canvas, e);
        InputEvent::PointerMove { x, y }
    }));
    listeners.push(pointer("mousedown", |canvas, e| {
        let (x, y) = canvas_point(canvas, e);
        InputEvent::PointerDown {
            button: PointerButton::from_dom(e.button()),
            x,
            y,
        }
    }));
    listeners.push(pointer("click", |canvas, e| {
        let (x, y) = canvas_point(canvas, e);
        InputEvent::Click {
            button: PointerButton::from_dom(e.button()),
            x,
            y,
            shift: e.shift_key(),
        }
    }));
    listeners.push(pointer("mouseleave", |_, _| InputEvent::PointerLeave));

    {
        let canvas_for_event = canvas.clone();
        let handle = handle.clone();
        listeners.push(EventListener::new_with_options(
            canvas,
            "contextmenu",
            blocking,
            move |event| {
                event.prevent_default();
                if let Some(e) = event.dyn_ref::<MouseEvent>() {
                    let (x, y) = canvas_point(&canvas_for_event, e);
                    handle.dispatch(SessionMsg::Input(InputEvent::ContextMenu {
                        x,
                        y,
                        client_x: f64::from(e.client_x()),
                        client_y: f64::from(e.client_y()),
                    }));
                }
            },
        ));
    }
    {
        let handle = handle.clone();
        listeners.push(EventListener::new_with_options(
            canvas,
            "wheel",
            blocking,
            move |event| {
                event.prevent_default();
                if let Some(e) = event.dyn_ref::<WheelEvent>() {
                    handle.dispatch(SessionMsg::Input(InputEvent::Wheel {
                        delta_y: e.delta_y(),
                    }));
                }
            },
        ));
    }

    if let Some(window) = web_sys::window() {
        // Pan ends even when the button is released outside the canvas
        let up_handle = handle.clone();
        listeners.push(EventListener::new(&window, "mouseup", move |event| {
            if let Some(e) = event.dyn_ref::<MouseEvent>() {
                up_handle.dispatch(SessionMsg::Input(InputEvent::PointerUp {
                    button: PointerButton::from_dom(e.button()),
                }));
            }
        }));

        let key_handle = handle.clone();
        listeners.push(EventListener::new(&window, "keydown", move |event| {
            let typing = event
                .target()
                .is_some_and(|target| target.dyn_ref::<HtmlInputElement>().is_some());
            if typing {
                return;
            }
            if let Some(e) = event.dyn_ref::<KeyboardEvent>() {
                key_handle.dispatch(SessionMsg::Input(InputEvent::Key {
                    key: e.key(),
                    shift: e.shift_key(),
                }));
            }
        }));
    }

    listeners
}

#[function_component(MapCanvas)]
pub fn map_canvas(props: &MapCanvasProps) -> Html {
    let container_ref = use_node_ref();
    let canvas_ref = use_node_ref();
    let sheet = use_memo((), |_| HtmlImageElement::new().ok());

    // Sprite sheet
    {
        let handle = props.handle.clone();
        let sheet = sheet.clone();
        use_effect_with((), move |_| {
            let listeners = (*sheet).as_ref().map(|image| {
                let loaded = image.clone();
                let on_load = EventListener::new(image, "load", move |_| {
                    let columns = loaded.natural_width() / TILE_SIZE;
                    handle.dispatch(SessionMsg::TilesLoaded(TileSheet::loaded(columns)));
                });
                let on_error = EventListener::new(image, "error", |_| {
                    tracing::warn!("Tile sheet failed to load; drawing flat tiles");
                });
                image.set_src(TILE_SHEET_URL);
                (on_load, on_error)
            });
            move || drop(listeners)
        });
    }

    // Input
    {
        let handle = props.handle.clone();
        let canvas_ref = canvas_ref.clone();
        use_effect_with((), move |_| {
            let listeners = canvas_ref
                .cast::<HtmlCanvasElement>()
                .map(|canvas| input_listeners(&canvas, &handle))
                .unwrap_or_default();
            move || drop(listeners)
        });
    }

    // Resize
    {
        let handle = props.handle.clone();
        let canvas_ref = canvas_ref.clone();
        let container_ref = container_ref.clone();
        use_effect_with((), move |_| {
            let observed = (|| {
                let canvas = canvas_ref.cast::<HtmlCanvasElement>()?;
                let container = container_ref.cast::<Element>()?;
                let context = context_2d(&canvas).ok()?;
                sync_canvas_size(&container, &canvas, &context, &handle);

                let target = container.clone();
                let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |_entries| {
                    sync_canvas_size(&container, &canvas, &context, &handle);
                });
                let observer = ResizeObserver::new(callback.as_ref().unchecked_ref()).ok()?;
                observer.observe(&target);
                Some((observer, callback))
            })();
            if observed.is_none() {
                tracing::error!("Canvas resize observation unavailable");
            }
            move || {
                if let Some((observer, _callback)) = observed {
                    observer.disconnect();
                }
            }
        });
    }

    // Frame loop
    {
        let session = props.handle.session.clone();
        let canvas_ref = canvas_ref.clone();
        let sheet = sheet.clone();
        use_effect_with((), move |_| {
            let running = Rc::new(Cell::new(true));
            let frame_id = Rc::new(Cell::new(None::<i32>));
            let closure: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));

            let context = canvas_ref
                .cast::<HtmlCanvasElement>()
                .and_then(|canvas| context_2d(&canvas).ok());
            match (context, (*sheet).clone()) {
                (Some(context), Some(sheet)) => {
                    let running = running.clone();
                    let frame_id = frame_id.clone();
                    let closure_clone = closure.clone();
                    *closure.borrow_mut() = Some(Closure::new(move |_timestamp: f64| {
                        if !running.get() {
                            return;
                        }
                        if let Ok(session) = session.try_borrow() {
                            let mut surface = CanvasSurface::new(&context, &sheet);
                            draw_frame(&session, &mut surface);
                        }
                        if let (Some(window), Some(cb)) =
                            (web_sys::window(), closure_clone.borrow().as_ref())
                        {
                            frame_id.set(
                                window
                                    .request_animation_frame(cb.as_ref().unchecked_ref())
                                    .ok(),
                            );
                        }
                    }));
                }
                _ => tracing::error!("Canvas 2d context unavailable"),
            }

            // Start the loop
            if let (Some(window), Some(cb)) = (web_sys::window(), closure.borrow().as_ref()) {
                frame_id.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
            }

            move || {
                running.set(false);
                if let (Some(id), Some(window)) = (frame_id.get(), web_sys::window()) {
                    let _ = window.cancel_animation_frame(id);
                }
                // Drop the closure to break its self-reference
                closure.borrow_mut().take();
            }
        });
    }

    html! {
        <div class="editor-main" ref={container_ref}>
            <canvas class="map-canvas" ref={canvas_ref} />
        </div>
    }
}
