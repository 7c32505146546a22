//! Registration method sets shared by [`App`](crate::App) and
//! [`Group`](crate::Group).
//!
//! The implementing type provides
//! `fn register(&mut self, &[Method], &str, Arc<dyn Handler>) -> Result<(), RouteError>`.

macro_rules! registration_methods {
    ($($verb:ident, $try_verb:ident => $method:ident;)*) => {
        $(
            #[doc = concat!("Registers a `", stringify!($method), "` route.")]
            ///
            /// # Panics
            ///
            /// Panics if the pattern is invalid.
            pub fn $verb<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
                self.some(&[Method::$method], path, handler)
            }

            #[doc = concat!("Registers a `", stringify!($method), "` route, returning registration errors.")]
            pub fn $try_verb<H: Handler>(
                &mut self,
                path: &str,
                handler: H,
            ) -> Result<&mut Self, RouteError> {
                self.try_some(&[Method::$method], path, handler)
            }
        )*

        /// Registers `handler` under every known HTTP method.
        ///
        /// # Panics
        ///
        /// Panics if the pattern is invalid.
        pub fn all<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
            self.some(&KNOWN_METHODS, path, handler)
        }

        /// Fallible form of `all`.
        pub fn try_all<H: Handler>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError> {
            self.try_some(&KNOWN_METHODS, path, handler)
        }

        /// Registers `handler` under each of `methods`.
        ///
        /// # Panics
        ///
        /// Panics if the pattern is invalid or a method is not one of the
        /// nine standard verbs.
        pub fn some<H: Handler>(&mut self, methods: &[Method], path: &str, handler: H) -> &mut Self {
            match self.try_some(methods, path, handler) {
                Ok(this) => this,
                Err(err) => panic!("failed to register route {path}: {err}"),
            }
        }

        /// Fallible form of `some`. Nothing is registered if any method or
        /// the pattern is rejected.
        pub fn try_some<H: Handler>(
            &mut self,
            methods: &[Method],
            path: &str,
            handler: H,
        ) -> Result<&mut Self, RouteError> {
            self.register(methods, path, Arc::new(handler))?;
            Ok(self)
        }

        /// Registers a route under a method given by name, such as `"GET"`.
        ///
        /// # Panics
        ///
        /// Panics if the method is not a standard verb or the pattern is
        /// invalid.
        pub fn route<H: Handler>(&mut self, method: &str, path: &str, handler: H) -> &mut Self {
            match self.try_route(method, path, handler) {
                Ok(this) => this,
                Err(err) => panic!("failed to register route {method} {path}: {err}"),
            }
        }

        /// Fallible form of `route`.
        pub fn try_route<H: Handler>(
            &mut self,
            method: &str,
            path: &str,
            handler: H,
        ) -> Result<&mut Self, RouteError> {
            let parsed = Method::from_bytes(method.as_bytes())
                .map_err(|_| RouteError::UnknownMethod(method.to_string()))?;
            self.try_some(&[parsed], path, handler)
        }
    };
}

macro_rules! verb_methods {
    () => {
        registration_methods! {
            get, try_get => GET;
            post, try_post => POST;
            put, try_put => PUT;
            patch, try_patch => PATCH;
            delete, try_delete => DELETE;
            head, try_head => HEAD;
            options, try_options => OPTIONS;
            connect, try_connect => CONNECT;
            trace, try_trace => TRACE;
        }
    };
}
