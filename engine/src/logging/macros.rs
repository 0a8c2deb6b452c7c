/// Emit a `tracing` event tagged with `scope`, filtered by the active [`LogConfig`].
///
/// [`LogConfig`]: crate::logging::LogConfig
#[macro_export]
macro_rules! scoped_log {
    ($level:ident, $scope:expr, $($arg:tt)*) => {{
        if $crate::logging::get_log_config().should_log($scope, $crate::logging::Level::$level) {
            $crate::logging::event!($crate::logging::Level::$level, scope = $scope, $($arg)*);
        }
    }};
}

#[macro_export]
macro_rules! physics_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "physics", $($arg)*)
    };
}

#[macro_export]
macro_rules! input_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "input", $($arg)*)
    };
}

#[macro_export]
macro_rules! interaction_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "interaction", $($arg)*)
    };
}

#[macro_export]
macro_rules! teleport_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "teleport", $($arg)*)
    };
}

#[macro_export]
macro_rules! scene_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "scene", $($arg)*)
    };
}

#[macro_export]
macro_rules! assets_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "assets", $($arg)*)
    };
}

#[macro_export]
macro_rules! frame_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "frame", $($arg)*)
    };
}
