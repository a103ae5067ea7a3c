pub mod app;
pub use app::App;

mod controller;

pub mod msg_list;
pub use msg_list::MsgListPanel;

pub mod port;
pub use port::PortsPanel;

pub mod view;
pub use view::View;
