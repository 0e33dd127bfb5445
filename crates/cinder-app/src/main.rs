// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod commands;
mod ipc;
mod state;
mod windows;

use cinder_pty::TerminalConfig;
use state::AppState;
use tauri::menu::{MenuBuilder, MenuItemBuilder, PredefinedMenuItem, SubmenuBuilder};
use tauri::{Manager, RunEvent, WindowEvent};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app_state = AppState::new(load_config());

    let app = tauri::Builder::default()
        .manage(app_state)
        .setup(|app| {
            // Build native menu bar.
            build_menu(app)?;
            windows::spawn_window(app.handle())?;
            Ok(())
        })
        .on_menu_event(|app, event| {
            if event.id().as_ref() == "new-window" {
                if let Err(e) = windows::spawn_window(app) {
                    log::warn!("Failed to open window: {e}");
                }
            }
        })
        .on_window_event(|window, event| {
            if let WindowEvent::Destroyed = event {
                windows::window_destroyed(window.app_handle(), window.label());
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::terminal::create_session,
            commands::terminal::write_input,
            commands::terminal::resize_session,
            commands::terminal::destroy_session,
            commands::window::open_window,
            commands::window::close_window,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app, event| match event {
        // Closing the last window quits everywhere except macOS.
        RunEvent::ExitRequested { code: None, api, .. } if cfg!(target_os = "macos") => {
            api.prevent_exit();
        }
        RunEvent::Exit => windows::app_quitting(app),
        #[cfg(target_os = "macos")]
        RunEvent::Reopen {
            has_visible_windows: false,
            ..
        } => {
            if let Err(e) = windows::spawn_window(app) {
                log::warn!("Failed to reopen window: {e}");
            }
        }
        _ => {}
    });
}

/// Read `~/.cinder/config.json`, falling back to defaults on any problem.
fn load_config() -> TerminalConfig {
    let Some(path) = TerminalConfig::default_path() else {
        log::warn!("No home directory; using default terminal config");
        return TerminalConfig::default();
    };
    match TerminalConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}; using default terminal config");
            TerminalConfig::default()
        }
    }
}

/// Build the native menu bar.
fn build_menu(app: &mut tauri::App) -> Result<(), Box<dyn std::error::Error>> {
    let handle = app.handle();

    // App submenu (Cinder)
    let app_menu = SubmenuBuilder::new(handle, "Cinder")
        .about(None)
        .separator()
        .quit()
        .build()?;

    // File submenu
    let new_window = MenuItemBuilder::with_id("new-window", "New Window")
        .accelerator("CmdOrCtrl+Shift+N")
        .build(handle)?;

    let close_window = PredefinedMenuItem::close_window(handle, Some("Close Window"))?;

    let file_menu = SubmenuBuilder::new(handle, "File")
        .item(&new_window)
        .separator()
        .item(&close_window)
        .build()?;

    // Edit submenu (standard)
    let edit_menu = SubmenuBuilder::new(handle, "Edit")
        .undo()
        .redo()
        .separator()
        .cut()
        .copy()
        .paste()
        .select_all()
        .build()?;

    // Window submenu
    let window_menu = SubmenuBuilder::new(handle, "Window")
        .minimize()
        .build()?;

    let menu = MenuBuilder::new(handle)
        .item(&app_menu)
        .item(&file_menu)
        .item(&edit_menu)
        .item(&window_menu)
        .build()?;

    app.set_menu(menu)?;

    Ok(())
}
