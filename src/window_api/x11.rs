use anyhow::Result;
use tracing::instrument;
use xcb::{
    x::{self, Atom, GetProperty, InternAtom, Window, ATOM_ANY},
    Connection, Xid,
};

use super::WindowManager;

fn get_active_window_atom(conn: &Connection) -> Result<Atom> {
    let active_window_atom = conn.wait_for_reply(conn.send_request(&InternAtom {
        only_if_exists: false,
        name: b"_NET_ACTIVE_WINDOW",
    }))?;
    Ok(active_window_atom.atom())
}

fn get_net_wm_name_atom(conn: &Connection) -> Result<Atom> {
    let response = conn.wait_for_reply(conn.send_request(&InternAtom {
        only_if_exists: false,
        name: b"_NET_WM_NAME",
    }))?;
    Ok(response.atom())
}

fn get_active_window(
    conn: &Connection,
    root: &Window,
    active_window_atom: Atom,
) -> Result<Option<Window>> {
    let result = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window: *root,
        property: active_window_atom,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1,
    }))?;
    let windows = result.value::<Window>();
    if windows.is_empty() || windows[0].is_none() {
        return Ok(None);
    }
    Ok(Some(windows[0]))
}

pub fn get_name(conn: &Connection, window: Window, wm_name_atom: Atom) -> Result<String> {
    let wm_name = conn.wait_for_reply(conn.send_request(&x::GetProperty {
        delete: false,
        window,
        property: wm_name_atom,
        r#type: x::ATOM_ANY,
        long_offset: 0,
        long_length: 1024,
    }))?;
    let title = String::from_utf8_lossy(wm_name.value()).into_owned();
    Ok(title)
}

pub struct LinuxWindowManager {
    connection: Connection,
    preferred_screen: i32,
    active_window_atom: Atom,
    window_name_atom: Atom,
}

impl LinuxWindowManager {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = xcb::Connection::connect(None)?;
        let active_window_atom = get_active_window_atom(&connection)?;
        let name_atom = get_net_wm_name_atom(&connection)?;
        Ok(Self {
            connection,
            preferred_screen,
            active_window_atom,
            window_name_atom: name_atom,
        })
    }

    #[instrument(skip(self))]
    fn get_active_title_inner(&self) -> Result<Option<String>> {
        let setup = self.connection.get_setup();

        // Currently the application only supports 1 x11 screen.
        let default_window = setup
            .roots()
            .nth(self.preferred_screen.max(0) as usize)
            .unwrap()
            .root();

        let Some(active_window) =
            get_active_window(&self.connection, &default_window, self.active_window_atom)?
        else {
            return Ok(None);
        };
        let title = get_name(&self.connection, active_window, self.window_name_atom)?;
        Ok(Some(title))
    }
}

impl WindowManager for LinuxWindowManager {
    fn active_window_title(&mut self) -> Result<Option<String>> {
        self.get_active_title_inner()
    }
}
