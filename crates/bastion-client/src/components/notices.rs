//! Dismissable error and warning notices.

use std::rc::Rc;

use bastion_core::{Notice, NoticeLevel};
use yew::prelude::*;

/// Most notices kept on screen at once.
pub const MAX_NOTICES: usize = 5;

pub enum NoticeAction {
    Push(Vec<Notice>),
    Dismiss(usize),
}

/// Notices currently on screen, oldest first.
#[derive(Default, PartialEq)]
pub struct NoticeBoard {
    pub notices: Vec<Notice>,
}

impl Reducible for NoticeBoard {
    type Action = NoticeAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut notices = self.notices.clone();
        match action {
            NoticeAction::Push(incoming) => {
                notices.extend(incoming);
                let overflow = notices.len().saturating_sub(MAX_NOTICES);
                notices.drain(..overflow);
            }
            NoticeAction::Dismiss(index) => {
                if index < notices.len() {
                    notices.remove(index);
                }
            }
        }
        Rc::new(Self { notices })
    }
}

#[derive(Properties, PartialEq)]
pub struct NoticeListProps {
    pub notices: Vec<Notice>,
    /// Index of the notice to dismiss.
    pub on_dismiss: Callback<usize>,
}

#[function_component(NoticeList)]
pub fn notice_list(props: &NoticeListProps) -> Html {
    if props.notices.is_empty() {
        return html! {};
    }

    let items = props.notices.iter().enumerate().map(|(index, notice)| {
        let class = match notice.level {
            NoticeLevel::Error => "notice-error",
            NoticeLevel::Warning => "notice-warning",
            NoticeLevel::Info => "notice-info",
        };
        let onclick = props.on_dismiss.reform(move |_: MouseEvent| index);
        html! {
            <li class={classes!("notice", class)} {onclick} title="Click to dismiss">
                { &notice.message }
            </li>
        }
    });

    html! {
        <ul class="notices">{ for items }</ul>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_push_keeps_newest() {
        let board = Rc::new(NoticeBoard {
            notices: (0..4).map(|i| Notice::error(format!("e{i}"))).collect(),
        });
        let board = board.reduce(NoticeAction::Push(vec![
            Notice::warning("w1"),
            Notice::warning("w2"),
        ]));
        assert_eq!(board.notices.len(), MAX_NOTICES);
        assert_eq!(board.notices[0].message, "e1");
        assert_eq!(board.notices[4].message, "w2");
    }

    #[wasm_bindgen_test]
    fn test_dismiss_out_of_range_is_ignored() {
        let board = Rc::new(NoticeBoard {
            notices: vec![Notice::error("a"), Notice::error("b")],
        });
        let board = board.reduce(NoticeAction::Dismiss(0));
        assert_eq!(board.notices, vec![Notice::error("b")]);
        let board = board.reduce(NoticeAction::Dismiss(5));
        assert_eq!(board.notices.len(), 1);
    }
}
